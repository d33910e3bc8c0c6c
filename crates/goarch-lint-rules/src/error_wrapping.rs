//! Rule requiring returned errors to be wrapped.
//!
//! # Detected Patterns
//!
//! A `return` whose result is a bare identifier named `err`, or ending in
//! `Error`, returns the error without adding context:
//!
//! ```go
//! return nil, err                           // flagged
//! return nil, errors.Wrap(err, "load task") // ok
//! ```
//!
//! Any call in result position (`Wrap`, `Wrapf`, `WithStack`,
//! `WithMessage`, ...) counts as wrapped.

use crate::tree_index::{self, NodeIndex};
use goarch_lint_core::{NodeKind, NodeTag, Pass, Rule, RuleError, Severity};

/// Rule code for error-wrapping.
pub const CODE: &str = "GA006";

/// Rule name for error-wrapping.
pub const NAME: &str = "error-wrapping";

/// Requires errors to be wrapped before they are returned.
#[derive(Debug, Clone)]
pub struct ErrorWrapping {
    severity: Severity,
}

impl Default for ErrorWrapping {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorWrapping {
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

fn is_error_name(name: &str) -> bool {
    name == "err" || name.ends_with("Error")
}

impl Rule for ErrorWrapping {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires returned errors to be wrapped with context"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn requires(&self) -> &[&'static str] {
        &[tree_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let index = pass.result_of::<NodeIndex>(tree_index::NAME)?;
        let tree = pass.tree();

        for &id in index.nodes(NodeTag::ReturnStmt) {
            let ret = tree.node(id);
            let NodeKind::ReturnStmt { results } = ret.kind() else {
                continue;
            };
            for result in results.iter().map(|r| ret.get(*r)) {
                let Some(name) = result.ident().filter(|n| is_error_name(n)) else {
                    continue;
                };
                let diagnostic = pass
                    .diagnostic(
                        result.span(),
                        format!("error `{name}` is returned without wrapping"),
                    )
                    .with_help(format!(
                        "Add context, e.g. `errors.Wrap({name}, \"...\")`"
                    ));
                pass.report(diagnostic);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    fn positions(src: &str) -> Vec<(usize, usize, String)> {
        check(ErrorWrapping::new(), "svc.go", src)
            .into_iter()
            .map(|d| (d.location.line, d.location.column, d.message))
            .collect()
    }

    #[test]
    fn flags_bare_err_and_error_names() {
        let src = r#"package svc

func Load() (*Task, error) {
	t, err := find()
	if err != nil {
		return nil, err
	}
	return t, ValidationError
}
"#;
        assert_eq!(
            positions(src),
            [
                (6, 15, "error `err` is returned without wrapping".to_string()),
                (
                    8,
                    12,
                    "error `ValidationError` is returned without wrapping".to_string()
                ),
            ]
        );
    }

    #[test]
    fn wrapped_and_unrelated_returns_pass() {
        let src = r#"package svc

func Load() error {
	if err := find(); err != nil {
		return errors.Wrap(err, "find")
	}
	if err := save(); err != nil {
		return pkgerrors.WrapWithCode(err, 3)
	}
	return fmt.Errorf("x: %w", ErrNotFound)
}
"#;
        assert!(positions(src).is_empty());
    }
}
