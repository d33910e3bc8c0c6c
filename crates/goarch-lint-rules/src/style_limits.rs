//! Rule enforcing general size, naming and import-order limits.
//!
//! # Detected Patterns
//!
//! - Function bodies with too many top-level statements, parameters or
//!   results
//! - Structs with too many fields, or an exported field after an unexported
//!   one
//! - Interfaces breaking the size and naming contract of `interface-contract`
//! - Constants that are not `UPPER_CASE`, other declared names containing an
//!   underscore
//! - Package names that are not a single lowercase word
//! - Imports not grouped standard library, third-party, then internal
//!
//! # Configuration
//!
//! - `max_statements`: Maximum top-level statements per body (default: 50)
//! - `max_params`: Maximum parameters (default: 5)
//! - `max_results`: Maximum results (default: 3)
//! - `max_fields`: Maximum struct fields (default: 10)
//! - `max_methods`: Maximum interface methods (default: 5)

use crate::decl_index::{self, Declarations};
use crate::interface_contract::{interface_problems, method_count};
use crate::tree_index::{self, NodeIndex};
use crate::util::{field_count, is_exported};
use goarch_lint_core::{
    NodeKind, NodeRef, NodeTag, Pass, Rule, RuleConfig, RuleError, Severity, Span,
};

/// Rule code for style-limits.
pub const CODE: &str = "GA010";

/// Rule name for style-limits.
pub const NAME: &str = "style-limits";

/// Thresholds for style limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleLimitsConfig {
    /// Maximum top-level statements in a function body.
    pub max_statements: usize,
    /// Maximum parameters of a function.
    pub max_params: usize,
    /// Maximum results of a function.
    pub max_results: usize,
    /// Maximum fields of a struct.
    pub max_fields: usize,
    /// Maximum methods of an interface.
    pub max_methods: usize,
}

impl Default for StyleLimitsConfig {
    fn default() -> Self {
        Self {
            max_statements: 50,
            max_params: 5,
            max_results: 3,
            max_fields: 10,
            max_methods: 5,
        }
    }
}

impl StyleLimitsConfig {
    /// Reads thresholds from a `[rules.style-limits]` table, keeping the
    /// defaults for missing keys.
    #[must_use]
    pub fn from_config(config: &RuleConfig) -> Self {
        let defaults = Self::default();
        Self {
            max_statements: config.get_usize("max_statements", defaults.max_statements),
            max_params: config.get_usize("max_params", defaults.max_params),
            max_results: config.get_usize("max_results", defaults.max_results),
            max_fields: config.get_usize("max_fields", defaults.max_fields),
            max_methods: config.get_usize("max_methods", defaults.max_methods),
        }
    }
}

/// Enforces size, naming and import-order limits.
#[derive(Debug, Clone)]
pub struct StyleLimits {
    config: StyleLimitsConfig,
    severity: Severity,
}

impl Default for StyleLimits {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleLimits {
    /// Creates a new rule with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(StyleLimitsConfig::default())
    }

    /// Creates a rule with the given thresholds.
    #[must_use]
    pub fn with_config(config: StyleLimitsConfig) -> Self {
        Self {
            config,
            severity: Severity::Warning,
        }
    }

    /// Sets maximum top-level statements.
    #[must_use]
    pub fn max_statements(mut self, max: usize) -> Self {
        self.config.max_statements = max;
        self
    }

    /// Sets maximum struct fields.
    #[must_use]
    pub fn max_fields(mut self, max: usize) -> Self {
        self.config.max_fields = max;
        self
    }

    /// Sets the severity level.
    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Current thresholds.
    #[must_use]
    pub fn config(&self) -> &StyleLimitsConfig {
        &self.config
    }
}

/// Import class, in the order groups must appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ImportClass {
    Standard,
    ThirdParty,
    Internal,
}

impl ImportClass {
    fn of(path: &str, module: Option<&str>) -> Self {
        if module.is_some_and(|m| path.contains(m)) {
            Self::Internal
        } else if path.contains('.') {
            Self::ThirdParty
        } else {
            Self::Standard
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Standard => "standard library",
            Self::ThirdParty => "third-party",
            Self::Internal => "internal",
        }
    }
}

fn is_constant_case(name: &str) -> bool {
    !name.contains(' ') && !name.chars().any(char::is_lowercase)
}

fn is_package_name(name: &str, is_test: bool) -> bool {
    let name = if is_test {
        name.strip_suffix("_test").unwrap_or(name)
    } else {
        name
    };
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

struct Findings(Vec<(Span, String)>);

impl Findings {
    fn push(&mut self, span: Span, message: impl Into<String>) {
        self.0.push((span, message.into()));
    }
}

impl StyleLimits {
    fn check_functions(&self, decls: &Declarations, pass: &Pass<'_>, out: &mut Findings) {
        let tree = pass.tree();
        for info in &decls.funcs {
            let func = tree.node(info.node);
            let Some(parts) = func.kind().func_parts() else {
                continue;
            };
            let span = func.span();
            let name = &info.name;

            if let Some(body) = parts.body {
                let statements = func.get(body).children().len();
                if statements > self.config.max_statements {
                    out.push(
                        span,
                        format!(
                            "function `{name}` has {statements} statements (max: {})",
                            self.config.max_statements
                        ),
                    );
                }
            }
            let params = field_count(Some(func.get(parts.params)));
            if params > self.config.max_params {
                out.push(
                    span,
                    format!(
                        "function `{name}` has {params} parameters (max: {})",
                        self.config.max_params
                    ),
                );
            }
            let results = field_count(parts.results.map(|r| func.get(r)));
            if results > self.config.max_results {
                out.push(
                    span,
                    format!(
                        "function `{name}` has {results} results (max: {})",
                        self.config.max_results
                    ),
                );
            }
        }
    }

    fn check_types(&self, decls: &Declarations, pass: &Pass<'_>, out: &mut Findings) {
        let tree = pass.tree();
        for info in decls.structs() {
            let NodeKind::StructType { fields } = tree.node(info.ty).kind() else {
                continue;
            };
            let fields = tree.node(*fields);
            let count = field_count(Some(fields));
            if count > self.config.max_fields {
                out.push(
                    tree.node(info.name_node).span(),
                    format!(
                        "struct `{}` has {count} fields (max: {})",
                        info.name, self.config.max_fields
                    ),
                );
            }
            check_field_order(fields, out);
        }

        for info in decls.interfaces() {
            let methods = method_count(tree.node(info.ty));
            let span = tree.node(info.name_node).span();
            for problem in interface_problems(&info.name, methods, self.config.max_methods) {
                out.push(span, problem);
            }
        }
    }
}

fn check_field_order(fields: NodeRef<'_>, out: &mut Findings) {
    let mut seen_unexported = false;
    for field in fields.children() {
        let NodeKind::Field { names, ty, .. } = field.kind() else {
            continue;
        };
        let named: Vec<NodeRef<'_>> = if names.is_empty() {
            vec![field.get(*ty)]
        } else {
            names.iter().map(|n| field.get(*n)).collect()
        };
        for name in named {
            let text = name.text().trim_start_matches('*');
            let text = text.rsplit('.').next().unwrap_or(text);
            if is_exported(text) {
                if seen_unexported {
                    out.push(
                        name.span(),
                        format!("exported field `{text}` should be declared before unexported fields"),
                    );
                }
            } else {
                seen_unexported = true;
            }
        }
    }
}

fn check_names(index: &NodeIndex, pass: &Pass<'_>, out: &mut Findings) {
    let tree = pass.tree();

    for &id in index.nodes(NodeTag::ConstDecl) {
        for spec in tree.node(id).children() {
            let NodeKind::ValueSpec { names, .. } = spec.kind() else {
                continue;
            };
            for name in names.iter().map(|n| spec.get(*n)) {
                match name.ident() {
                    Some(text) if text != "_" && !is_constant_case(text) => out.push(
                        name.span(),
                        format!("constant `{text}` should be UPPER_CASE"),
                    ),
                    _ => {}
                }
            }
        }
    }

    let mut declared: Vec<NodeRef<'_>> = Vec::new();
    for &id in index.nodes(NodeTag::VarDecl) {
        for spec in tree.node(id).children() {
            if let NodeKind::ValueSpec { names, .. } = spec.kind() {
                declared.extend(names.iter().map(|n| spec.get(*n)));
            }
        }
    }
    for &id in index.nodes(NodeTag::TypeSpec) {
        let spec = tree.node(id);
        if let NodeKind::TypeSpec { name, .. } = spec.kind() {
            declared.push(spec.get(*name));
        }
    }
    for &id in index.nodes(NodeTag::FuncDecl) {
        let func = tree.node(id);
        if let Some(name) = func.kind().func_parts().and_then(|p| p.name) {
            declared.push(func.get(name));
        }
    }
    declared.sort_by_key(|n| n.span().start);

    for name in declared {
        match name.ident() {
            Some(text) if text != "_" && (text.contains('_') || text.contains(' ')) => out.push(
                name.span(),
                format!("name `{text}` should use mixedCaps without underscores"),
            ),
            _ => {}
        }
    }
}

fn check_package(pass: &Pass<'_>, out: &mut Findings) {
    let is_test = pass.file().is_test();
    for clause in pass.tree().root().children() {
        if let NodeKind::PackageClause { name } = clause.kind() {
            if !is_package_name(name, is_test) {
                out.push(
                    clause.span(),
                    format!("package name `{name}` should be a single lowercase word"),
                );
            }
        }
    }
}

fn check_imports(index: &NodeIndex, pass: &Pass<'_>, out: &mut Findings) {
    let tree = pass.tree();
    let module = pass.module();
    let imports: Vec<(NodeRef<'_>, &str)> = index
        .nodes(NodeTag::ImportSpec)
        .iter()
        .filter_map(|&id| {
            let spec = tree.node(id);
            match spec.kind() {
                NodeKind::ImportSpec { path, .. } => Some((spec, path.as_str())),
                _ => None,
            }
        })
        .collect();

    for pair in imports.windows(2) {
        let (previous, current) = (pair[0], pair[1]);
        let before = ImportClass::of(previous.1, module);
        let after = ImportClass::of(current.1, module);
        if after < before {
            out.push(
                current.0.span(),
                format!(
                    "{} import \"{}\" should come before {} imports",
                    after.label(),
                    current.1,
                    before.label()
                ),
            );
        }
    }
}

impl Rule for StyleLimits {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Limits function and type sizes, enforces naming and import grouping"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires(&self) -> &[&'static str] {
        &[tree_index::NAME, decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let index = pass.result_of::<NodeIndex>(tree_index::NAME)?;
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;

        let mut out = Findings(Vec::new());
        check_package(pass, &mut out);
        check_imports(index, pass, &mut out);
        self.check_functions(decls, pass, &mut out);
        self.check_types(decls, pass, &mut out);
        check_names(index, pass, &mut out);

        for (span, message) in out.0 {
            let diagnostic = pass.diagnostic(span, message);
            pass.report(diagnostic);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;
    use goarch_lint_core::Config;
    use std::fmt::Write;

    fn messages(rule: StyleLimits, path: &str, src: &str) -> Vec<String> {
        check(rule, path, src).into_iter().map(|d| d.message).collect()
    }

    fn struct_with(fields: usize) -> String {
        let mut src = String::from("package app\n\ntype Wide struct {\n");
        for i in 0..fields {
            let _ = writeln!(src, "\tField{i} int");
        }
        src.push_str("}\n");
        src
    }

    #[test]
    fn ten_fields_pass_eleven_fail_once() {
        assert!(messages(StyleLimits::new(), "wide.go", &struct_with(10)).is_empty());
        assert_eq!(
            messages(StyleLimits::new(), "wide.go", &struct_with(11)),
            ["struct `Wide` has 11 fields (max: 10)"]
        );
    }

    #[test]
    fn function_limits() {
        let src = "package app\n\nfunc Many(a, b, c int, d, e, f string) (int, int, int, error) {\n\treturn 0, 0, 0, nil\n}\n";
        assert_eq!(
            messages(StyleLimits::new(), "f.go", src),
            [
                "function `Many` has 6 parameters (max: 5)",
                "function `Many` has 4 results (max: 3)",
            ]
        );

        let body = "\tx()\n".repeat(3);
        let src = format!("package app\n\nfunc Long() {{\n{body}}}\n");
        assert_eq!(
            messages(StyleLimits::new().max_statements(2), "f.go", &src),
            ["function `Long` has 3 statements (max: 2)"]
        );
    }

    #[test]
    fn exported_after_unexported_fields() {
        let src = "package app\n\ntype T struct {\n\tName string\n\tid   int\n\tAge  int\n\t*Base\n}\n";
        assert_eq!(
            messages(StyleLimits::new(), "t.go", src),
            [
                "exported field `Age` should be declared before unexported fields",
                "exported field `Base` should be declared before unexported fields",
            ]
        );
    }

    #[test]
    fn naming_rules() {
        let src = r#"package my_app

const MaxItems = 3
const DEFAULT_LIMIT = 10

var user_name string

type task_list []string

func do_work() {}
"#;
        insta::assert_debug_snapshot!(messages(StyleLimits::new(), "n.go", src), @r###"
        [
            "package name `my_app` should be a single lowercase word",
            "constant `MaxItems` should be UPPER_CASE",
            "name `user_name` should use mixedCaps without underscores",
            "name `task_list` should use mixedCaps without underscores",
            "name `do_work` should use mixedCaps without underscores",
        ]
        "###);
    }

    #[test]
    fn test_packages_may_use_test_suffix() {
        assert!(messages(StyleLimits::new(), "app_test.go", "package app_test\n").is_empty());
        assert_eq!(
            messages(StyleLimits::new(), "app.go", "package app_test\n"),
            ["package name `app_test` should be a single lowercase word"]
        );
    }

    #[test]
    fn import_groups_must_be_ordered() {
        let src = r#"package app

import (
	"fmt"
	"example.com/app/internal/domain"
	"github.com/pkg/errors"
	"os"
)
"#;
        assert_eq!(
            messages(StyleLimits::new(), "app.go", src),
            [
                "third-party import \"github.com/pkg/errors\" should come before internal imports",
                "standard library import \"os\" should come before third-party imports",
            ]
        );
    }

    #[test]
    fn interface_rules_are_duplicated() {
        let src = "package app\n\ntype Tasks interface{ A() }\n";
        assert_eq!(
            messages(StyleLimits::new(), "interfaces.go", src),
            ["interface name `Tasks` should end in \"er\" or \"Service\""]
        );
    }

    #[test]
    fn thresholds_from_config() {
        let config = Config::parse(
            r#"
[rules.style-limits]
max_fields = 3
max_params = -1
"#,
        )
        .expect("config");
        let limits = StyleLimitsConfig::from_config(config.rule(NAME).expect("rule"));
        assert_eq!(limits.max_fields, 3);
        assert_eq!(limits.max_params, 5);
        assert_eq!(limits.max_statements, 50);
    }
}
