//! Prerequisite pass listing type and function declarations.

use crate::tree_index::{self, NodeIndex};
use goarch_lint_core::{NodeId, NodeKind, NodeRef, NodeTag, Pass, ReceiverKind, Rule, RuleError};

/// Rule code for decl-index.
pub const CODE: &str = "GA100";

/// Rule name for decl-index.
pub const NAME: &str = "decl-index";

/// Shape of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeShape {
    /// `struct { ... }`.
    Struct,
    /// `interface { ... }`.
    Interface,
    /// Anything else (`type ID int64`, aliases, ...).
    Other,
}

/// A `type Name ...` spec.
#[derive(Debug, Clone)]
pub struct TypeDeclInfo {
    /// Declared name.
    pub name: String,
    /// Shape of the type expression.
    pub shape: TypeShape,
    /// The `TypeSpec` node.
    pub spec: NodeId,
    /// The name identifier.
    pub name_node: NodeId,
    /// The type expression.
    pub ty: NodeId,
}

/// A `func` declaration.
#[derive(Debug, Clone)]
pub struct FuncDeclInfo {
    /// Declared name.
    pub name: String,
    /// Receiver base type name and kind, for methods.
    pub receiver: Option<(String, ReceiverKind)>,
    /// The `FuncDecl` node.
    pub node: NodeId,
}

/// Declarations of one unit, in source order.
#[derive(Debug, Default)]
pub struct Declarations {
    /// Type specs, including ones local to function bodies.
    pub types: Vec<TypeDeclInfo>,
    /// Function and method declarations.
    pub funcs: Vec<FuncDeclInfo>,
}

impl Declarations {
    /// Struct types.
    pub fn structs(&self) -> impl Iterator<Item = &TypeDeclInfo> {
        self.types.iter().filter(|t| t.shape == TypeShape::Struct)
    }

    /// Interface types.
    pub fn interfaces(&self) -> impl Iterator<Item = &TypeDeclInfo> {
        self.types.iter().filter(|t| t.shape == TypeShape::Interface)
    }

    /// Methods whose receiver base type is `type_name`.
    pub fn methods_of<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a FuncDeclInfo> {
        self.funcs
            .iter()
            .filter(move |f| f.receiver.as_ref().is_some_and(|(base, _)| base == type_name))
    }
}

/// Publishes [`Declarations`] for each unit.
#[derive(Debug, Default, Clone, Copy)]
pub struct DeclIndex;

impl DeclIndex {
    /// Creates the pass.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for DeclIndex {
    fn name(&self) -> &'static str {
        NAME
    }

    fn code(&self) -> &'static str {
        CODE
    }

    fn description(&self) -> &'static str {
        "Lists type and function declarations for later passes"
    }

    fn requires(&self) -> &[&'static str] {
        &[tree_index::NAME]
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        let index = pass.result_of::<NodeIndex>(tree_index::NAME)?;
        let tree = pass.tree();
        let mut decls = Declarations::default();

        for &id in index.nodes(NodeTag::TypeSpec) {
            let spec = tree.node(id);
            let NodeKind::TypeSpec { name, ty } = spec.kind() else {
                continue;
            };
            let Some(type_name) = spec.get(*name).ident() else {
                continue;
            };
            let shape = match spec.get(*ty).kind() {
                NodeKind::StructType { .. } => TypeShape::Struct,
                NodeKind::InterfaceType { .. } => TypeShape::Interface,
                _ => TypeShape::Other,
            };
            decls.types.push(TypeDeclInfo {
                name: type_name.to_string(),
                shape,
                spec: id,
                name_node: *name,
                ty: *ty,
            });
        }

        for &id in index.nodes(NodeTag::FuncDecl) {
            let func = tree.node(id);
            let Some(parts) = func.kind().func_parts() else {
                continue;
            };
            let Some(name) = parts.name.and_then(|n| func.get(n).ident()) else {
                continue;
            };
            decls.funcs.push(FuncDeclInfo {
                name: name.to_string(),
                receiver: parts.recv.and_then(|r| receiver(func.get(r))),
                node: id,
            });
        }

        tracing::debug!(
            "{}: {} types, {} functions",
            pass.file().relative_path().display(),
            decls.types.len(),
            decls.funcs.len()
        );
        pass.set_result(decls);
        Ok(())
    }
}

fn receiver(list: NodeRef<'_>) -> Option<(String, ReceiverKind)> {
    let field = list.children().next()?;
    let NodeKind::Field { ty, .. } = field.kind() else {
        return None;
    };
    let ty = field.get(*ty);
    let (base, kind) = match ty.kind() {
        NodeKind::PointerType { elem } => (ty.get(*elem), ReceiverKind::Pointer),
        _ => (ty, ReceiverKind::Value),
    };
    // Generic receivers (`T[K]`) keep the name as their first child.
    let name = base
        .ident()
        .or_else(|| base.children().next().and_then(NodeRef::ident))?;
    Some((name.to_string(), kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::unit;
    use goarch_lint_core::{Analyzer, Registry};
    use std::sync::{Arc, Mutex};

    #[test]
    fn lists_types_and_methods() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);

        let mut registry = Registry::new();
        registry.register(tree_index::TreeIndex::new());
        registry.register(DeclIndex::new());
        registry.register_fn("probe", "T900", "", &[NAME], move |pass| {
            let decls = pass.result_of::<Declarations>(NAME)?;
            let mut lines = Vec::new();
            for t in &decls.types {
                lines.push(format!("type {} {:?}", t.name, t.shape));
            }
            for f in &decls.funcs {
                lines.push(format!("func {} {:?}", f.name, f.receiver));
            }
            if let Ok(mut out) = sink.lock() {
                *out = lines;
            }
            Ok(())
        });

        let analyzer = Analyzer::builder()
            .root("/project")
            .registry(registry)
            .build()
            .expect("analyzer");
        let unit = unit(
            "task.go",
            r"package domain

type Task struct{ ID int64 }
type Store interface{ Get() }
type ID int64

func (t *Task) Validate() error { return nil }
func (s Set[K]) Len() int { return 0 }
func New() *Task { return nil }
",
        );
        assert!(analyzer.run_unit(&unit).is_empty());

        let lines = captured.lock().expect("lock").clone();
        assert_eq!(
            lines,
            [
                "type Task Struct",
                "type Store Interface",
                "type ID Other",
                "func Validate Some((\"Task\", Pointer))",
                "func Len Some((\"Set\", Value))",
                "func New None",
            ]
        );
    }
}
