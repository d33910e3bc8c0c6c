//! Rule placing domain entities in the domain layer.
//!
//! A struct with an `ID` field and a `CreatedAt` or `UpdatedAt` field is a
//! domain entity. It must live in a package whose import path has a `domain`
//! segment and must have a pointer-receiver `Validate` method. Either check
//! is skipped when the package path or method set is unknown.

use crate::decl_index::{self, Declarations};
use goarch_lint_core::{
    Capabilities, NodeKind, NodeRef, Pass, ReceiverKind, Rule, RuleError, Severity,
};

/// Rule code for domain-layering.
pub const CODE: &str = "GA003";

/// Rule name for domain-layering.
pub const NAME: &str = "domain-layering";

/// Checks placement and validation of domain entities.
#[derive(Debug, Clone)]
pub struct DomainLayering {
    severity: Severity,
}

impl Default for DomainLayering {
    fn default() -> Self {
        Self::new()
    }
}

impl DomainLayering {
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

/// Names of the named fields of a struct type.
pub(crate) fn struct_field_names(ty: NodeRef<'_>) -> Vec<&str> {
    let NodeKind::StructType { fields } = ty.kind() else {
        return Vec::new();
    };
    ty.get(*fields)
        .children()
        .flat_map(|field| match field.kind() {
            NodeKind::Field { names, .. } => names
                .iter()
                .filter_map(|n| field.get(*n).ident())
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        })
        .collect()
}

fn is_domain_entity(ty: NodeRef<'_>) -> bool {
    let names = struct_field_names(ty);
    names.contains(&"ID") && (names.contains(&"CreatedAt") || names.contains(&"UpdatedAt"))
}

impl Rule for DomainLayering {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Requires domain entities to live in a domain package and validate themselves"
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
        let semantics = pass.semantics();

        for info in decls.structs() {
            if !is_domain_entity(tree.node(info.ty)) {
                continue;
            }
            let name = tree.node(info.name_node);

            if let Some(package) = semantics.package_path(info.name_node) {
                if !package.split('/').any(|segment| segment == "domain") {
                    let diagnostic = pass
                        .diagnostic(
                            name.span(),
                            format!(
                                "domain type `{}` must live in a `domain` package, found `{package}`",
                                info.name
                            ),
                        )
                        .with_help("Move the type under a `domain` directory");
                    pass.report(diagnostic);
                }
            }

            let methods = semantics
                .type_of(info.name_node)
                .and_then(|ty| semantics.method_set(ty));
            if let Some(methods) = methods {
                let validates = methods
                    .get("Validate")
                    .is_some_and(|m| m.receiver == ReceiverKind::Pointer);
                if !validates {
                    let diagnostic = pass
                        .diagnostic(
                            name.span(),
                            format!(
                                "domain type `{}` must have a pointer-receiver `Validate` method",
                                info.name
                            ),
                        )
                        .with_help(format!("Add `func (x *{}) Validate() error`", info.name));
                    pass.report(diagnostic);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::check;

    const ENTITY: &str = "type Task struct {\n\tID        int64\n\tTitle     string\n\tCreatedAt int64\n}\n";

    fn messages(path: &str, src: &str) -> Vec<String> {
        check(DomainLayering::new(), path, src)
            .into_iter()
            .map(|d| d.message)
            .collect()
    }

    #[test]
    fn entity_outside_domain_without_validate() {
        let src = format!("package storage\n\n{ENTITY}");
        assert_eq!(
            messages("internal/storage/task.go", &src),
            [
                "domain type `Task` must live in a `domain` package, found `example.com/app/internal/storage`",
                "domain type `Task` must have a pointer-receiver `Validate` method",
            ]
        );
    }

    #[test]
    fn value_receiver_validate_is_not_enough() {
        let src = format!(
            "package domain\n\n{ENTITY}\nfunc (t Task) Validate() error {{ return nil }}\n"
        );
        assert_eq!(
            messages("internal/domain/task.go", &src),
            ["domain type `Task` must have a pointer-receiver `Validate` method"]
        );
    }

    #[test]
    fn well_placed_entity_is_clean() {
        let src = format!(
            "package domain\n\n{ENTITY}\nfunc (t *Task) Validate() error {{ return nil }}\n"
        );
        assert!(messages("domain/task.go", &src).is_empty());
    }

    #[test]
    fn non_entities_are_ignored() {
        let src = "package storage\n\ntype Row struct {\n\tID   int64\n\tName string\n}\n";
        assert!(messages("storage/row.go", src).is_empty());
    }
}
