//! Rule presets for common configurations.

use crate::{
    ApiHandler, DeclIndex, DomainLayering, ErrorWrapping, InterfaceContract, InterfaceLocation,
    MiddlewareChain, StorageShape, StructuredLogging, StyleLimits, StyleLimitsConfig, TaskFields,
    TreeIndex,
};
use goarch_lint_core::{Config, Registry, RuleBox};

/// Preset configurations for goarch-lint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Every catalog rule.
    #[default]
    Recommended,
    /// Layering, contracts and storage rules only.
    Architecture,
    /// Interface placement and style limits, for gradual adoption.
    Minimal,
}

impl Preset {
    /// All presets, in documentation order.
    pub const ALL: [Preset; 3] = [Self::Recommended, Self::Architecture, Self::Minimal];

    /// Looks a preset up by its configuration name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::Recommended),
            "architecture" => Some(Self::Architecture),
            "minimal" => Some(Self::Minimal),
            _ => None,
        }
    }

    /// Configuration name of the preset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::Architecture => "architecture",
            Self::Minimal => "minimal",
        }
    }

    /// Returns the rules for this preset with default settings.
    ///
    /// The prerequisite passes are always included.
    #[must_use]
    pub fn rules(self) -> Vec<RuleBox> {
        self.rules_with(StyleLimitsConfig::default())
    }

    fn rules_with(self, limits: StyleLimitsConfig) -> Vec<RuleBox> {
        let mut rules = prerequisite_rules();
        match self {
            Self::Recommended => {
                rules.push(Box::new(ApiHandler::new()));
                rules.push(Box::new(MiddlewareChain::new()));
                rules.extend(architecture_rules());
                rules.push(Box::new(StructuredLogging::new()));
                rules.push(Box::new(TaskFields::new()));
                rules.push(Box::new(StyleLimits::with_config(limits)));
            }
            Self::Architecture => rules.extend(architecture_rules()),
            Self::Minimal => {
                rules.push(Box::new(InterfaceLocation::new()));
                rules.push(Box::new(StyleLimits::with_config(limits)));
            }
        }
        rules
    }
}

fn prerequisite_rules() -> Vec<RuleBox> {
    vec![Box::new(TreeIndex::new()), Box::new(DeclIndex::new())]
}

/// GA003-GA007.
fn architecture_rules() -> Vec<RuleBox> {
    vec![
        Box::new(DomainLayering::new()),
        Box::new(InterfaceContract::new()),
        Box::new(StorageShape::new()),
        Box::new(ErrorWrapping::new()),
        Box::new(InterfaceLocation::new()),
    ]
}

/// Returns all available rules, prerequisites included.
#[must_use]
pub fn all_rules() -> Vec<RuleBox> {
    Preset::Recommended.rules()
}

/// Builds the rules of `preset`, taking rule options from `config`.
///
/// Only `style-limits` has options: its thresholds are read from the
/// `[rules.style-limits]` table. Enabling and severity overrides are applied
/// by the analyzer.
#[must_use]
pub fn rules_from_config(preset: Preset, config: &Config) -> Vec<RuleBox> {
    let limits = config
        .rule(crate::style_limits::NAME)
        .map(StyleLimitsConfig::from_config)
        .unwrap_or_default();
    preset.rules_with(limits)
}

/// Collects rules into a registry.
#[must_use]
pub fn registry(rules: Vec<RuleBox>) -> Registry {
    let mut registry = Registry::new();
    for rule in rules {
        registry.register_box(rule);
    }
    registry
}
