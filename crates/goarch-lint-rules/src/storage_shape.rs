//! Rule checking the shape of storage types.
//!
//! A type named `...Store` or `...Repository` must reference `.Error`
//! (domain error wrapping) anywhere in its declaration, and must have a
//! `BeginTx` method (transaction support). `BeginTx` is accepted as an
//! interface method, a method declared in the same file, or a member of the
//! type's package-wide method set.

use crate::decl_index::{self, Declarations, TypeDeclInfo};
use goarch_lint_core::visit::find_all;
use goarch_lint_core::{
    Capabilities, NodeKind, NodeRef, Pass, Rule, RuleError, SemanticBridge, Severity, SyntaxTree,
};

/// Rule code for storage-shape.
pub const CODE: &str = "GA005";

/// Rule name for storage-shape.
pub const NAME: &str = "storage-shape";

/// Checks error wrapping and transaction support of storage types.
#[derive(Debug, Clone)]
pub struct StorageShape {
    severity: Severity,
}

impl Default for StorageShape {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageShape {
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

fn is_storage(name: &str) -> bool {
    name.ends_with("Store") || name.ends_with("Repository")
}

fn references_error(root: NodeRef<'_>) -> bool {
    !find_all(root, |n| match n.kind() {
        NodeKind::SelectorExpr { field, .. } => n.get(*field).ident() == Some("Error"),
        _ => false,
    })
    .is_empty()
}

fn declares_begin_tx(root: NodeRef<'_>) -> bool {
    !find_all(root, |n| match n.kind() {
        NodeKind::MethodSpec { name, .. } => n.get(*name).ident() == Some("BeginTx"),
        _ => false,
    })
    .is_empty()
}

struct Shape {
    wraps_errors: bool,
    has_begin_tx: bool,
}

fn inspect(
    info: &TypeDeclInfo,
    decls: &Declarations,
    tree: &SyntaxTree,
    semantics: &dyn SemanticBridge,
) -> Shape {
    let spec = tree.node(info.spec);
    let wraps_errors = references_error(spec);
    let mut has_begin_tx = declares_begin_tx(spec)
        || decls.methods_of(&info.name).any(|m| m.name == "BeginTx");

    if !has_begin_tx {
        has_begin_tx = semantics
            .type_of(info.name_node)
            .and_then(|ty| semantics.method_set(ty))
            .is_some_and(|set| set.contains("BeginTx"));
    }

    Shape {
        wraps_errors,
        has_begin_tx,
    }
}

impl Rule for StorageShape {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires storage types to wrap errors and support transactions"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SEMANTIC
    }

    fn requires(&self) -> &[&'static str] {
        &[decl_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let decls = pass.result_of::<Declarations>(decl_index::NAME)?;
        let tree = pass.tree();

        for info in decls.types.iter().filter(|t| is_storage(&t.name)) {
            let shape = inspect(info, decls, tree, pass.semantics());
            let span = tree.node(info.name_node).span();

            if !shape.wraps_errors {
                let diagnostic = pass
                    .diagnostic(
                        span,
                        format!(
                            "storage type `{}` does not use domain error wrapping",
                            info.name
                        ),
                    )
                    .with_help("Return domain errors, e.g. `domain.Error{...}`");
                pass.report(diagnostic);
            }
            if !shape.has_begin_tx {
                let diagnostic = pass
                    .diagnostic(
                        span,
                        format!(
                            "storage type `{}` does not support transactions (missing `BeginTx`)",
                            info.name
                        ),
                    )
                    .with_help("Add `BeginTx(ctx context.Context) (Tx, error)`");
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

    fn messages(src: &str) -> Vec<String> {
        check(StorageShape::new(), "store.go", src)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn bare_store_interface_reports_both() {
        let src = "package storage\n\ntype TaskStore interface {\n\tGet(id int64) (*Task, error)\n}\n";
        assert_eq!(
            messages(src),
            [
                "storage type `TaskStore` does not use domain error wrapping",
                "storage type `TaskStore` does not support transactions (missing `BeginTx`)",
            ]
        );
    }

    #[test]
    fn interface_with_begin_tx_and_error_selector() {
        let src = "package storage\n\ntype TaskRepository interface {\n\tBeginTx(ctx context.Context) (Tx, error)\n\tFail() domain.Error\n}\n";
        assert!(messages(src).is_empty());
    }

    #[test]
    fn begin_tx_method_counts_but_method_bodies_do_not() {
        let src = r#"package storage

type TaskStore struct {
	db *sql.DB
}

func (s *TaskStore) BeginTx(ctx context.Context) (*sql.Tx, error) {
	return s.db.BeginTx(ctx, nil)
}

func (s *TaskStore) Get(id int64) error {
	return errs.Error("not found")
}
"#;
        assert_eq!(
            messages(src),
            ["storage type `TaskStore` does not use domain error wrapping"]
        );
    }

    #[test]
    fn error_field_in_struct_declaration_counts() {
        let src = "package storage\n\ntype TaskStore struct {\n\tdb   *sql.DB\n\tfail domain.Error\n}\n\nfunc (s *TaskStore) BeginTx() {}\n";
        assert!(messages(src).is_empty());
    }

    #[test]
    fn other_types_are_ignored() {
        assert!(messages("package storage\n\ntype Task struct{}\n").is_empty());
    }
}
