//! Rule keeping interfaces small and conventionally named.
//!
//! An interface may declare at most five methods, and its name must end in
//! `er` or `Service`. Each broken constraint is its own diagnostic.

use crate::decl_index::{self, Declarations};
use goarch_lint_core::{NodeKind, NodeRef, Pass, Rule, RuleError, Severity};

/// Rule code for interface-contract.
pub const CODE: &str = "GA004";

/// Rule name for interface-contract.
pub const NAME: &str = "interface-contract";

/// Default maximum number of methods per interface.
pub const DEFAULT_MAX_METHODS: usize = 5;

/// Checks interface size and naming.
#[derive(Debug, Clone)]
pub struct InterfaceContract {
    severity: Severity,
}

impl Default for InterfaceContract {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceContract {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            severity: Severity::Warning,
        }
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Number of methods an interface type declares directly.
pub(crate) fn method_count(ty: NodeRef<'_>) -> usize {
    match ty.kind() {
        NodeKind::InterfaceType { elems } => elems
            .iter()
            .filter(|e| matches!(ty.get(**e).kind(), NodeKind::MethodSpec { .. }))
            .count(),
        _ => 0,
    }
}

/// Size and naming problems of an interface, in reporting order.
pub(crate) fn interface_problems(name: &str, methods: usize, max_methods: usize) -> Vec<String> {
    let mut problems = Vec::new();
    if methods > max_methods {
        problems.push(format!(
            "interface `{name}` declares {methods} methods (max: {max_methods})"
        ));
    }
    if !(name.ends_with("er") || name.ends_with("Service")) {
        problems.push(format!(
            "interface name `{name}` should end in \"er\" or \"Service\""
        ));
    }
    problems
}

impl Rule for InterfaceContract {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Limits interfaces to five methods and requires an -er or Service suffix"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires(&self) -> &[&'static str] {
        &[decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;
        let tree = pass.tree();

        for info in decls.interfaces() {
            let methods = method_count(tree.node(info.ty));
            let span = tree.node(info.name_node).span();
            for problem in interface_problems(&info.name, methods, DEFAULT_MAX_METHODS) {
                let diagnostic = pass.diagnostic(span, problem);
                pass.report(diagnostic);
            }
        }
        Ok(())
    }
}
