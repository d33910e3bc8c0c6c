//! Rule requiring interfaces to be declared in `interfaces.go` files.
//!
//! Only the file name matters: package boundaries and file content are not
//! considered. Every interface declared elsewhere is reported once.

use crate::decl_index::{self, Declarations};
use goarch_lint_core::{Pass, Rule, RuleError, Severity};

/// Rule code for interface-location.
pub const CODE: &str = "GA007";

/// Rule name for interface-location.
pub const NAME: &str = "interface-location";

/// Checks where interfaces are declared.
#[derive(Debug, Clone)]
pub struct InterfaceLocation {
    severity: Severity,
}

impl Default for InterfaceLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl InterfaceLocation {
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

impl Rule for InterfaceLocation {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires interfaces to be declared in interfaces.go files"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires(&self) -> &[&'static str] {
        &[decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        if pass.file().file_name().ends_with("interfaces.go") {
            return Ok(());
        }
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;
        let tree = pass.tree();

        for info in decls.interfaces() {
            let diagnostic = pass
                .diagnostic(
                    tree.node(info.name_node).span(),
                    format!(
                        "interface `{}` should be declared in an interfaces.go file",
                        info.name
                    ),
                )
                .with_help("Move the interface to interfaces.go in the same package");
            pass.report(diagnostic);
        }
        Ok(())
    }
}
