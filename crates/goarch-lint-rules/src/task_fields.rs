//! Rule normalizing the fields of task types.
//!
//! For composite literals and field accesses whose static type name ends in
//! `Task`:
//!
//! - `Content` is renamed to `Title` and `Done` to `Completed`, each with an
//!   exact replacement of the field name token
//! - `CreatedAt`/`UpdatedAt` must be assigned an `int64` Unix timestamp; a
//!   `time.Now()` value gets a fix appending `.Unix()`
//!
//! Values of unknown type and untyped numeric constants are skipped.

use goarch_lint_core::visit::walk;
use goarch_lint_core::{
    Capabilities, FixBuilder, LitKind, NodeId, NodeKind, NodeRef, Pass, Rule, RuleError,
    SemanticBridge, Severity,
};

/// Rule code for task-fields.
pub const CODE: &str = "GA009";

/// Rule name for task-fields.
pub const NAME: &str = "task-fields";

const RENAMES: &[(&str, &str)] = &[("Content", "Title"), ("Done", "Completed")];

const TIME_FIELDS: &[&str] = &["CreatedAt", "UpdatedAt"];

/// Normalizes task field names and timestamp types.
#[derive(Debug, Clone)]
pub struct TaskFields {
    severity: Severity,
}

impl Default for TaskFields {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskFields {
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

fn is_task(semantics: &dyn SemanticBridge, node: NodeId) -> bool {
    semantics
        .type_of(node)
        .and_then(|t| t.name())
        .is_some_and(|name| name.ends_with("Task"))
}

/// True for a zero-argument `Now()` call.
fn is_current_time(value: NodeRef<'_>) -> bool {
    match value.kind() {
        NodeKind::CallExpr { args, .. } => {
            args.is_empty() && crate::util::callee_name(value) == Some("Now")
        }
        _ => false,
    }
}

impl TaskFields {
    fn check_rename(&self, pass: &mut Pass<'_>, field: NodeRef<'_>) -> Result<(), RuleError> {
        let Some(name) = field.ident() else {
            return Ok(());
        };
        let Some((_, to)) = RENAMES.iter().find(|(from, _)| *from == name) else {
            return Ok(());
        };
        let fix = FixBuilder::new(format!("Rename `{name}` to `{to}`"))
            .replace(field.span(), *to)
            .build()?;
        let diagnostic = pass
            .diagnostic(
                field.span(),
                format!("task field `{name}` should be named `{to}`"),
            )
            .with_fix(fix);
        pass.report(diagnostic);
        Ok(())
    }

    fn check_time(
        &self,
        pass: &mut Pass<'_>,
        field: NodeRef<'_>,
        value: NodeRef<'_>,
    ) -> Result<(), RuleError> {
        if !field.ident().is_some_and(|n| TIME_FIELDS.contains(&n)) {
            return Ok(());
        }
        if is_numeric_constant(value) {
            return Ok(());
        }
        let Some(ty) = pass.semantics().type_of(value.id()) else {
            return Ok(());
        };
        if ty.is_int64() {
            return Ok(());
        }
        let mut diagnostic = pass
            .diagnostic(value.span(), "time fields must be int64 (Unix timestamp)")
            .with_help(format!("`{}` is assigned a value of type `{ty}`", field.text()));
        if is_current_time(value) {
            let fix = FixBuilder::new("Convert to a Unix timestamp")
                .insert(value.span().end, ".Unix()")
                .build()?;
            diagnostic = diagnostic.with_fix(fix);
        }
        pass.report(diagnostic);
        Ok(())
    }
}

/// Untyped numeric constants such as `0` or `-1` take the field's type.
fn is_numeric_constant(value: NodeRef<'_>) -> bool {
    match value.kind() {
        NodeKind::BasicLit { kind, .. } => {
            matches!(kind, LitKind::Int | LitKind::Float | LitKind::Rune)
        }
        NodeKind::UnaryExpr { op, operand } if op == "-" || op == "+" => {
            is_numeric_constant(value.get(*operand))
        }
        _ => false,
    }
}

impl Rule for TaskFields {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Renames task fields to Title/Completed and requires int64 timestamps"
    }

    fn default_severity(&self) -> Severity {
        self.severity
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::SEMANTIC
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let semantics = pass.semantics();
        let mut nodes = Vec::new();
        walk(pass.tree().root(), |node| {
            nodes.push(node);
            true
        });

        for node in nodes {
            match node.kind() {
                NodeKind::CompositeLit { elements, .. } if is_task(semantics, node.id()) => {
                    for element in elements.iter().map(|e| node.get(*e)) {
                        let NodeKind::KeyValue { key, value } = element.kind() else {
                            continue;
                        };
                        let (key, value) = (element.get(*key), element.get(*value));
                        self.check_rename(pass, key)?;
                        self.check_time(pass, key, value)?;
                    }
                }
                NodeKind::SelectorExpr { operand, field } if is_task(semantics, *operand) => {
                    self.check_rename(pass, node.get(*field))?;
                }
                NodeKind::AssignStmt { lhs, rhs, .. } if lhs.len() == rhs.len() => {
                    for (target, value) in lhs.iter().zip(rhs) {
                        let target = node.get(*target);
                        if let NodeKind::SelectorExpr { operand, field } = target.kind() {
                            if is_task(semantics, *operand) {
                                self.check_time(pass, target.get(*field), node.get(*value))?;
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}
