//! File-local type and package resolution.
//!
//! Fills a [`FactTable`] from one lowered file: declared types and their
//! method sets, import aliases, and the static types of expressions that can
//! be typed from local declarations plus a small table of standard-library
//! signatures. Anything else stays unknown.

use goarch_lint_core::visit::walk;
use goarch_lint_core::{
    FactTable, FuncParts, LitKind, Method, NodeId, NodeKind, NodeRef, ReceiverKind, SyntaxTree,
    Type,
};
use std::collections::HashMap;

const BASIC_TYPES: &[&str] = &[
    "bool", "string", "int", "int8", "int16", "int32", "int64", "uint", "uint8", "uint16",
    "uint32", "uint64", "uintptr", "float32", "float64", "complex64", "complex128", "byte",
    "rune", "any",
];

/// Result types of selected package-level functions.
fn stdlib_function(package: &str, name: &str) -> Vec<Option<Type>> {
    let named = |pkg: &str, n: &str| Some(Type::named(Some(pkg), n));
    let basic = |n: &str| Some(Type::basic(n));
    match (package, name) {
        ("time", "Now") => vec![named("time", "Time")],
        ("time", "Since" | "Until") => vec![named("time", "Duration")],
        ("time", "Unix" | "UnixMilli") => vec![named("time", "Time")],
        ("errors", "New") | ("fmt", "Errorf") => vec![Some(Type::error())],
        ("errors", "Is" | "As") => vec![basic("bool")],
        ("errors", "Unwrap" | "Join") => vec![Some(Type::error())],
        ("fmt", "Sprintf" | "Sprint" | "Sprintln") => vec![basic("string")],
        ("strconv", "Itoa" | "FormatInt") => vec![basic("string")],
        ("strconv", "Atoi") => vec![basic("int"), Some(Type::error())],
        ("strconv", "ParseInt") => vec![basic("int64"), Some(Type::error())],
        ("context", "Background" | "TODO" | "WithValue") => vec![named("context", "Context")],
        ("context", "WithCancel" | "WithTimeout" | "WithDeadline") => vec![
            named("context", "Context"),
            named("context", "CancelFunc"),
        ],
        ("encoding/json", "Marshal" | "MarshalIndent") => vec![
            Some(Type::Slice(Box::new(Type::basic("byte")))),
            Some(Type::error()),
        ],
        ("encoding/json", "Unmarshal") => vec![Some(Type::error())],
        _ => Vec::new(),
    }
}

/// Result types of selected methods of standard-library types.
fn stdlib_method(package: &str, ty: &str, method: &str) -> Vec<Option<Type>> {
    match (package, ty, method) {
        ("time", "Time", "Unix" | "UnixNano" | "UnixMilli" | "UnixMicro") => {
            vec![Some(Type::basic("int64"))]
        }
        ("time", "Time", "Format" | "String") => vec![Some(Type::basic("string"))],
        ("time", "Time", "Add" | "UTC" | "Local" | "Truncate") => {
            vec![Some(Type::named(Some("time"), "Time"))]
        }
        ("net/http", "Request", "Context") => vec![Some(Type::named(Some("context"), "Context"))],
        ("net/http", "Request", "WithContext") => vec![Some(Type::Pointer(Box::new(
            Type::named(Some("net/http"), "Request"),
        )))],
        _ => Vec::new(),
    }
}

/// Default local name of an import path (`gopkg.in/yaml.v3` → `yaml`,
/// `github.com/x/y/v2` → `y`).
fn default_local_name(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    let last = segments.next().unwrap_or(path);
    let is_version = |s: &str| {
        s.strip_prefix('v')
            .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    };
    if is_version(last) {
        if let Some(previous) = segments.next() {
            return previous;
        }
    }
    match last.split_once(".v") {
        Some((name, version)) if version.bytes().all(|b| b.is_ascii_digit()) => name,
        _ => last,
    }
}

type Env = HashMap<String, Type>;

/// Computes facts for one file.
pub struct Resolver<'t> {
    tree: &'t SyntaxTree,
    package: Option<String>,
    imports: HashMap<String, String>,
    local_types: HashMap<String, NodeId>,
    struct_fields: HashMap<String, HashMap<String, Type>>,
    funcs: HashMap<String, Vec<Option<Type>>>,
    methods: HashMap<(String, String), Vec<Option<Type>>>,
    globals: Env,
    cache: HashMap<NodeId, Option<Type>>,
    facts: FactTable,
}

impl<'t> Resolver<'t> {
    /// Creates a resolver for a tree whose package has import path `package`.
    #[must_use]
    pub fn new(tree: &'t SyntaxTree, package: Option<String>) -> Self {
        let mut facts = FactTable::new();
        if let Some(package) = &package {
            facts.set_unit_package(package.clone());
        }
        Self {
            tree,
            package,
            imports: HashMap::new(),
            local_types: HashMap::new(),
            struct_fields: HashMap::new(),
            funcs: HashMap::new(),
            methods: HashMap::new(),
            globals: Env::new(),
            cache: HashMap::new(),
            facts,
        }
    }

    /// Adds methods declared in other files of the same package, keyed by
    /// receiver base type name.
    #[must_use]
    pub fn with_package_methods(mut self, methods: &[(String, Method)]) -> Self {
        for (base, method) in methods {
            let owner = self.local_type(base);
            self.facts.record_method(&owner, method.clone());
        }
        self
    }

    /// Runs resolution and returns the fact table.
    #[must_use]
    pub fn resolve(mut self) -> FactTable {
        let tree = self.tree;
        let decls: Vec<NodeRef<'t>> = tree.root().children().collect();

        for decl in &decls {
            match decl.kind() {
                NodeKind::ImportDecl => decl.children().for_each(|spec| self.import(spec)),
                NodeKind::TypeDecl => decl.children().for_each(|spec| self.declare_type(spec)),
                _ => {}
            }
        }
        for decl in &decls {
            match decl.kind() {
                NodeKind::TypeDecl => decl.children().for_each(|spec| self.struct_fields(spec)),
                NodeKind::FuncDecl(parts) => self.signature(*decl, parts),
                _ => {}
            }
        }
        for decl in &decls {
            if matches!(decl.kind(), NodeKind::VarDecl | NodeKind::ConstDecl) {
                let mut env = std::mem::take(&mut self.globals);
                for spec in decl.children() {
                    self.value_spec(spec, &mut env);
                    walk(spec, |node| {
                        let _ = self.expr_type(node, &env);
                        true
                    });
                }
                self.globals = env;
            }
        }
        for decl in &decls {
            if let NodeKind::FuncDecl(parts) = decl.kind() {
                self.function_body(*decl, parts);
            }
        }

        self.facts
    }

    fn local_type(&self, name: &str) -> Type {
        Type::named(self.package.as_deref(), name)
    }

    fn import(&mut self, spec: NodeRef<'t>) {
        let NodeKind::ImportSpec { path, alias } = spec.kind() else {
            return;
        };
        self.facts.record_package(spec.id(), path.clone());
        for child in spec.children() {
            if child.ident().is_some() {
                self.facts.record_package(child.id(), path.clone());
            }
        }
        let local = match alias.as_deref() {
            Some("_" | ".") => return,
            Some(alias) => alias,
            None => default_local_name(path),
        };
        self.imports.insert(local.to_string(), path.clone());
    }

    fn declare_type(&mut self, spec: NodeRef<'t>) {
        let NodeKind::TypeSpec { name, ty } = spec.kind() else {
            return;
        };
        let name_node = spec.get(*name);
        let Some(type_name) = name_node.ident() else {
            return;
        };
        let named = self.local_type(type_name);
        self.facts.declare_type(&named);
        self.facts.record_type(name_node.id(), named);
        self.local_types.insert(type_name.to_string(), *ty);
    }

    fn struct_fields(&mut self, spec: NodeRef<'t>) {
        let NodeKind::TypeSpec { name, ty } = spec.kind() else {
            return;
        };
        let Some(type_name) = spec.get(*name).ident() else {
            return;
        };
        let NodeKind::StructType { fields } = spec.get(*ty).kind() else {
            return;
        };

        let mut table = HashMap::new();
        for field in spec.get(*fields).children() {
            let NodeKind::Field { names, ty, .. } = field.kind() else {
                continue;
            };
            let Some(field_type) = self.type_expr(field.get(*ty)) else {
                continue;
            };
            if names.is_empty() {
                if let Some(embedded) = field_type.name() {
                    table.insert(embedded.to_string(), field_type.clone());
                }
            }
            for name in names {
                let name_node = field.get(*name);
                if let Some(field_name) = name_node.ident() {
                    self.facts.record_type(name_node.id(), field_type.clone());
                    table.insert(field_name.to_string(), field_type.clone());
                }
            }
        }
        self.struct_fields.insert(type_name.to_string(), table);
    }

    fn signature(&mut self, decl: NodeRef<'t>, parts: &FuncParts) {
        let Some(name) = parts.name.and_then(|n| decl.get(n).ident()) else {
            return;
        };
        let results = self.field_types(decl, parts.results);

        match parts.recv.and_then(|recv| receiver_base(decl.get(recv))) {
            Some((base, receiver)) => {
                let owner = self.local_type(base);
                self.facts.record_method(
                    &owner,
                    Method {
                        name: name.to_string(),
                        receiver,
                    },
                );
                self.methods
                    .insert((base.to_string(), name.to_string()), results);
            }
            None if parts.recv.is_none() => {
                self.funcs.insert(name.to_string(), results);
            }
            None => {}
        }
    }

    /// Types of a field list, one entry per declared name.
    fn field_types(&self, at: NodeRef<'t>, list: Option<NodeId>) -> Vec<Option<Type>> {
        let Some(list) = list else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for field in at.get(list).children() {
            if let NodeKind::Field { names, ty, .. } = field.kind() {
                let resolved = self.type_expr(field.get(*ty));
                out.extend(std::iter::repeat(resolved).take(names.len().max(1)));
            }
        }
        out
    }

    /// Adds the named fields of a list to `env`.
    fn bind_fields(&mut self, at: NodeRef<'t>, list: Option<NodeId>, env: &mut Env) {
        let Some(list) = list else {
            return;
        };
        for field in at.get(list).children() {
            let NodeKind::Field { names, ty, .. } = field.kind() else {
                continue;
            };
            let Some(resolved) = self.type_expr(field.get(*ty)) else {
                continue;
            };
            for name in names {
                let name_node = field.get(*name);
                if let Some(ident) = name_node.ident() {
                    self.facts.record_type(name_node.id(), resolved.clone());
                    env.insert(ident.to_string(), resolved.clone());
                }
            }
        }
    }

    fn value_spec(&mut self, spec: NodeRef<'t>, env: &mut Env) {
        let NodeKind::ValueSpec { names, ty, values } = spec.kind() else {
            return;
        };
        let declared = ty.and_then(|t| self.type_expr(spec.get(t)));
        let inferred = self.assigned_types(spec, values, names.len(), env);
        for (i, name) in names.iter().enumerate() {
            let resolved = declared
                .clone()
                .or_else(|| inferred.get(i).cloned().flatten());
            self.bind(spec.get(*name), resolved, env);
        }
    }

    /// Types assigned to `targets` names by `values`.
    fn assigned_types(
        &mut self,
        at: NodeRef<'t>,
        values: &[NodeId],
        targets: usize,
        env: &Env,
    ) -> Vec<Option<Type>> {
        if values.len() == targets {
            values
                .iter()
                .map(|v| self.expr_type(at.get(*v), env))
                .collect()
        } else if let [single] = values {
            let call = at.get(*single);
            // Prime the cache so the call node itself is typed.
            let _ = self.expr_type(call, env);
            self.call_results(call, env)
        } else {
            Vec::new()
        }
    }

    fn bind(&mut self, target: NodeRef<'t>, ty: Option<Type>, env: &mut Env) {
        let Some(name) = target.ident() else {
            return;
        };
        if name == "_" {
            return;
        }
        if let Some(ty) = ty {
            self.facts.record_type(target.id(), ty.clone());
            self.cache.insert(target.id(), Some(ty.clone()));
            env.insert(name.to_string(), ty);
        }
    }

    fn function_body(&mut self, decl: NodeRef<'t>, parts: &FuncParts) {
        let mut env = Env::new();
        self.bind_fields(decl, parts.recv, &mut env);
        self.bind_fields(decl, Some(parts.params), &mut env);
        self.bind_fields(decl, parts.results, &mut env);

        let Some(body) = parts.body else {
            return;
        };
        walk(decl.get(body), |node| {
            self.statement(node, &mut env);
            true
        });
    }

    fn statement(&mut self, node: NodeRef<'t>, env: &mut Env) {
        match node.kind() {
            NodeKind::AssignStmt { lhs, rhs, define } => {
                let types = self.assigned_types(node, rhs, lhs.len(), env);
                for (i, target) in lhs.iter().enumerate() {
                    let target = node.get(*target);
                    let mut ty = types.get(i).cloned().flatten();
                    if ty.is_none() && *define && i + 1 == lhs.len() && target.ident() == Some("err")
                    {
                        ty = Some(Type::error());
                    }
                    if *define || target.ident().is_some_and(|n| !env.contains_key(n)) {
                        self.bind(target, ty, env);
                    }
                }
            }
            NodeKind::ValueSpec { .. } => self.value_spec(node, env),
            NodeKind::FuncLit(parts) => {
                self.bind_fields(node, Some(parts.params), env);
                self.bind_fields(node, parts.results, env);
            }
            _ => {
                let _ = self.expr_type(node, env);
            }
        }
    }

    /// Resolves a type expression.
    fn type_expr(&self, node: NodeRef<'t>) -> Option<Type> {
        match node.kind() {
            NodeKind::Ident { name } if name == "error" => Some(Type::error()),
            NodeKind::Ident { name } if BASIC_TYPES.contains(&name.as_str()) => {
                Some(Type::basic(name.clone()))
            }
            NodeKind::Ident { name } => Some(self.local_type(name)),
            NodeKind::SelectorExpr { operand, field } => {
                let alias = node.get(*operand).ident()?;
                let name = node.get(*field).ident()?;
                let path = self.imports.get(alias).map_or(alias, String::as_str);
                Some(Type::named(Some(path), name))
            }
            NodeKind::PointerType { elem } => {
                Some(Type::Pointer(Box::new(self.type_expr(node.get(*elem))?)))
            }
            NodeKind::Other { kind } if kind == "slice_type" => {
                let elem = node.children().next()?;
                Some(Type::Slice(Box::new(self.type_expr(elem)?)))
            }
            NodeKind::Other { kind } if kind == "generic_type" || kind == "parenthesized_type" => {
                self.type_expr(node.children().next()?)
            }
            _ => None,
        }
    }

    /// True if `name` refers to an import rather than a variable.
    fn package_ref(&self, name: &str, env: &Env) -> Option<&str> {
        if env.contains_key(name) || self.globals.contains_key(name) {
            return None;
        }
        self.imports.get(name).map(String::as_str)
    }

    /// Static type of an expression, recorded in the fact table.
    fn expr_type(&mut self, node: NodeRef<'t>, env: &Env) -> Option<Type> {
        if let Some(known) = self.cache.get(&node.id()) {
            return known.clone();
        }
        let ty = self.compute_expr_type(node, env);
        if let Some(ty) = &ty {
            self.facts.record_type(node.id(), ty.clone());
        }
        self.cache.insert(node.id(), ty.clone());
        ty
    }

    fn compute_expr_type(&mut self, node: NodeRef<'t>, env: &Env) -> Option<Type> {
        match node.kind() {
            NodeKind::Ident { name } => {
                if let Some(path) = self.package_ref(name, env) {
                    let path = path.to_string();
                    self.facts.record_package(node.id(), path);
                    return None;
                }
                match name.as_str() {
                    "true" | "false" => Some(Type::basic("bool")),
                    _ => env.get(name).or_else(|| self.globals.get(name)).cloned(),
                }
            }
            NodeKind::BasicLit { kind, .. } => Some(Type::basic(match kind {
                LitKind::Int => "int",
                LitKind::Float => "float64",
                LitKind::Imaginary => "complex128",
                LitKind::Rune => "rune",
                LitKind::String | LitKind::RawString => "string",
            })),
            NodeKind::CompositeLit { ty, .. } => ty.and_then(|t| self.type_expr(node.get(t))),
            NodeKind::UnaryExpr { op, operand } => {
                let inner = self.expr_type(node.get(*operand), env);
                match op.as_str() {
                    "&" => inner.map(|t| Type::Pointer(Box::new(t))),
                    "*" => match inner {
                        Some(Type::Pointer(t)) => Some(*t),
                        _ => None,
                    },
                    "!" => Some(Type::basic("bool")),
                    _ => inner,
                }
            }
            NodeKind::CallExpr { .. } => self.call_results(node, env).into_iter().next().flatten(),
            NodeKind::SelectorExpr { operand, field } => {
                let operand = node.get(*operand);
                let field = node.get(*field).ident()?;
                let owner = self.expr_type(operand, env)?;
                match owner.strip_pointers() {
                    Type::Named { package, name } if *package == self.package => self
                        .struct_fields
                        .get(name)
                        .and_then(|fields| fields.get(field))
                        .cloned(),
                    _ => None,
                }
            }
            NodeKind::Other { kind } if kind == "parenthesized_expression" => {
                let inner = node.children().next()?;
                self.expr_type(inner, env)
            }
            _ => None,
        }
    }

    /// Result types of a call expression, or empty when unknown.
    fn call_results(&mut self, call: NodeRef<'t>, env: &Env) -> Vec<Option<Type>> {
        let NodeKind::CallExpr { fun, args } = call.kind() else {
            return Vec::new();
        };
        let fun = call.get(*fun);

        match fun.kind() {
            NodeKind::Ident { name } => {
                let name = name.as_str();
                if args.len() == 1 && BASIC_TYPES.contains(&name) {
                    return vec![Some(Type::basic(name))];
                }
                if args.len() == 1 && self.local_types.contains_key(name) {
                    return vec![Some(self.local_type(name))];
                }
                match name {
                    "new" => {
                        let elem = args.first().and_then(|a| self.type_expr(call.get(*a)));
                        vec![elem.map(|t| Type::Pointer(Box::new(t)))]
                    }
                    "len" | "cap" | "copy" => vec![Some(Type::basic("int"))],
                    "append" => {
                        vec![args.first().and_then(|a| self.expr_type(call.get(*a), env))]
                    }
                    _ => self.funcs.get(name).cloned().unwrap_or_default(),
                }
            }
            NodeKind::SelectorExpr { operand, field } => {
                let operand = fun.get(*operand);
                let Some(method) = fun.get(*field).ident() else {
                    return Vec::new();
                };
                if let Some(path) = operand.ident().and_then(|n| self.package_ref(n, env)) {
                    let path = path.to_string();
                    self.facts.record_package(operand.id(), path.clone());
                    return stdlib_function(&path, method);
                }

                let Some(receiver) = self.expr_type(operand, env) else {
                    return Vec::new();
                };
                if receiver.is_error() && method == "Error" {
                    return vec![Some(Type::basic("string"))];
                }
                match receiver.strip_pointers() {
                    Type::Named {
                        package: Some(package),
                        name,
                    } if Some(package) == self.package.as_ref() => self
                        .methods
                        .get(&(name.clone(), method.to_string()))
                        .cloned()
                        .unwrap_or_default(),
                    Type::Named {
                        package: Some(package),
                        name,
                    } => stdlib_method(package, name, method),
                    _ => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }
}

/// Base type name and receiver kind of a method receiver list.
/// Methods declared in `tree`, keyed by receiver base type name.
#[must_use]
pub fn receiver_methods(tree: &SyntaxTree) -> Vec<(String, Method)> {
    tree.root()
        .children()
        .filter_map(|decl| {
            let NodeKind::FuncDecl(parts) = decl.kind() else {
                return None;
            };
            let name = decl.get(parts.name?).ident()?;
            let (base, receiver) = receiver_base(decl.get(parts.recv?))?;
            Some((
                base.to_string(),
                Method {
                    name: name.to_string(),
                    receiver,
                },
            ))
        })
        .collect()
}

fn receiver_base(list: NodeRef<'_>) -> Option<(&str, ReceiverKind)> {
    let field = list.children().next()?;
    let NodeKind::Field { ty, .. } = field.kind() else {
        return None;
    };
    let (node, kind) = match field.get(*ty).kind() {
        NodeKind::PointerType { elem } => (field.get(*elem), ReceiverKind::Pointer),
        _ => (field.get(*ty), ReceiverKind::Value),
    };
    let base = match node.kind() {
        NodeKind::Ident { name } => name.as_str(),
        _ => node.children().next()?.ident()?,
    };
    Some((base, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::GoParser;
    use goarch_lint_core::visit::find_all;
    use goarch_lint_core::{NodeTag, SemanticBridge, SourceFile};
    use std::path::Path;

    fn resolve(src: &str) -> (SyntaxTree, FactTable) {
        let tree = GoParser::new()
            .parse(SourceFile::new(Path::new("x.go"), src, Path::new(".")))
            .expect("parse");
        let facts = Resolver::new(&tree, Some("example.com/app/domain".into())).resolve();
        (tree, facts)
    }

    fn type_of_text(tree: &SyntaxTree, facts: &FactTable, text: &str) -> Option<String> {
        find_all(tree.root(), |n| n.text() == text)
            .into_iter()
            .find_map(|n| facts.type_of(n.id()))
            .map(ToString::to_string)
    }

    #[test]
    fn default_local_names() {
        assert_eq!(default_local_name("fmt"), "fmt");
        assert_eq!(default_local_name("net/http"), "http");
        assert_eq!(default_local_name("github.com/go-chi/chi/v5"), "chi");
        assert_eq!(default_local_name("gopkg.in/yaml.v3"), "yaml");
    }

    #[test]
    fn method_sets_include_pointer_receivers() {
        let (_, facts) = resolve(
            "package domain\n\ntype Task struct{ ID int64 }\n\nfunc (t *Task) Validate() error { return nil }\nfunc (t Task) Name() string { return \"\" }\n",
        );
        let task = Type::named(Some("example.com/app/domain"), "Task");
        let set = facts.method_set(&task).expect("method set");
        assert_eq!(
            set.get("Validate").map(|m| m.receiver),
            Some(ReceiverKind::Pointer)
        );
        assert_eq!(set.get("Name").map(|m| m.receiver), Some(ReceiverKind::Value));
    }

    #[test]
    fn methods_from_other_files_join_the_set() {
        let (sibling, _) = resolve("package domain\n\nfunc (t *Task) Validate() error { return nil }\n");
        let methods = receiver_methods(&sibling);
        assert_eq!(methods.len(), 1);

        let tree = GoParser::new()
            .parse(SourceFile::new(
                Path::new("task.go"),
                "package domain\n\ntype Task struct{ ID int64 }\n",
                Path::new("."),
            ))
            .expect("parse");
        let facts = Resolver::new(&tree, Some("example.com/app/domain".into()))
            .with_package_methods(&methods)
            .resolve();
        let task = Type::named(Some("example.com/app/domain"), "Task");
        assert_eq!(
            facts
                .method_set(&task)
                .and_then(|set| set.get("Validate"))
                .map(|m| m.receiver),
            Some(ReceiverKind::Pointer)
        );
    }

    #[test]
    fn declared_types_without_methods_have_empty_sets() {
        let (_, facts) = resolve("package domain\n\ntype Store interface{ Get() }\n");
        let store = Type::named(Some("example.com/app/domain"), "Store");
        assert!(facts.method_set(&store).is_some_and(|s| s.is_empty()));
    }

    #[test]
    fn types_locals_calls_and_fields() {
        let (tree, facts) = resolve(
            r#"package domain

import (
	"errors"
	"time"
)

type Task struct {
	CreatedAt int64
}

func NewTask() (*Task, error) {
	t := &Task{CreatedAt: time.Now().Unix()}
	now := time.Now()
	stamp := t.CreatedAt
	err := errors.New("x")
	_ = now
	_ = stamp
	return t, err
}
"#,
        );
        assert_eq!(
            type_of_text(&tree, &facts, "&Task{CreatedAt: time.Now().Unix()}").as_deref(),
            Some("*example.com/app/domain.Task")
        );
        assert_eq!(
            type_of_text(&tree, &facts, "time.Now()").as_deref(),
            Some("time.Time")
        );
        assert_eq!(
            type_of_text(&tree, &facts, "time.Now().Unix()").as_deref(),
            Some("int64")
        );
        assert_eq!(
            type_of_text(&tree, &facts, "t.CreatedAt").as_deref(),
            Some("int64")
        );
        assert_eq!(
            type_of_text(&tree, &facts, "errors.New(\"x\")").as_deref(),
            Some("error")
        );

        let returns = find_all(tree.root(), |n| n.kind().tag() == NodeTag::ReturnStmt);
        let NodeKind::ReturnStmt { results } = returns[0].kind() else {
            panic!("return");
        };
        assert!(facts.type_of(results[1]).is_some_and(Type::is_error));
    }

    #[test]
    fn err_from_unknown_call_is_error() {
        let (tree, facts) = resolve(
            "package domain\n\nfunc f() error {\n\tv, err := lookup()\n\t_ = v\n\treturn err\n}\n",
        );
        let returns = find_all(tree.root(), |n| n.kind().tag() == NodeTag::ReturnStmt);
        let NodeKind::ReturnStmt { results } = returns[0].kind() else {
            panic!("return");
        };
        assert!(facts.type_of(results[0]).is_some_and(Type::is_error));
    }

    #[test]
    fn import_aliases_record_packages() {
        let (tree, facts) = resolve(
            "package domain\n\nimport log \"github.com/sirupsen/logrus\"\n\nfunc f() { log.Info(\"x\") }\n",
        );
        let uses = find_all(tree.root(), |n| n.ident() == Some("log"));
        assert_eq!(uses.len(), 2);
        for node in uses {
            assert_eq!(
                facts.package_path(node.id()),
                Some("github.com/sirupsen/logrus")
            );
        }
        assert_eq!(
            facts.package_path(tree.root().id()),
            Some("example.com/app/domain")
        );
    }

    #[test]
    fn params_shadow_packages() {
        let (tree, facts) = resolve(
            "package domain\n\nimport \"time\"\n\nfunc f(time string) string { return time }\n",
        );
        let returns = find_all(tree.root(), |n| n.kind().tag() == NodeTag::ReturnStmt);
        let NodeKind::ReturnStmt { results } = returns[0].kind() else {
            panic!("return");
        };
        assert_eq!(
            facts.type_of(results[0]).map(ToString::to_string).as_deref(),
            Some("string")
        );
    }
}
