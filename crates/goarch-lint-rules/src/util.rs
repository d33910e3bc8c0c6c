//! Shared tree helpers for rules.

use goarch_lint_core::visit::{find_all, walk};
use goarch_lint_core::{NodeKind, NodeRef};

/// Name of the called function or method: `f` for `f(x)`, `M` for `x.M()`.
#[must_use]
pub fn callee_name(call: NodeRef<'_>) -> Option<&str> {
    let NodeKind::CallExpr { fun, .. } = call.kind() else {
        return None;
    };
    let fun = call.get(*fun);
    match fun.kind() {
        NodeKind::Ident { name } => Some(name.as_str()),
        NodeKind::SelectorExpr { field, .. } => fun.get(*field).ident(),
        _ => None,
    }
}

/// True if the callee is written as a selector (`x.M()`).
#[must_use]
pub fn is_selector_call(call: NodeRef<'_>) -> bool {
    match call.kind() {
        NodeKind::CallExpr { fun, .. } => {
            matches!(call.get(*fun).kind(), NodeKind::SelectorExpr { .. })
        }
        _ => false,
    }
}

/// Argument nodes of a call.
#[must_use]
pub fn call_args(call: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    match call.kind() {
        NodeKind::CallExpr { args, .. } => args.iter().map(|a| call.get(*a)).collect(),
        _ => Vec::new(),
    }
}

/// Callee names of every call below `root`, in source order.
#[must_use]
pub fn callee_names(root: NodeRef<'_>) -> Vec<&str> {
    find_all(root, |n| matches!(n.kind(), NodeKind::CallExpr { .. }))
        .into_iter()
        .filter_map(callee_name)
        .collect()
}

/// Contents of a string literal without its quotes.
#[must_use]
pub fn string_value(node: NodeRef<'_>) -> Option<&str> {
    match node.kind() {
        NodeKind::BasicLit { kind, value } if kind.is_string() => {
            value.get(1..value.len().saturating_sub(1))
        }
        _ => None,
    }
}

/// Number of entries in a field list, counting each declared name.
#[must_use]
pub fn field_count(list: Option<NodeRef<'_>>) -> usize {
    list.map_or(0, |list| {
        list.children()
            .map(|field| match field.kind() {
                NodeKind::Field { names, .. } => names.len().max(1),
                _ => 0,
            })
            .sum()
    })
}

/// Type nodes of a field list, one per declared name.
#[must_use]
pub fn field_types(list: Option<NodeRef<'_>>) -> Vec<NodeRef<'_>> {
    let Some(list) = list else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for field in list.children() {
        if let NodeKind::Field { names, ty, .. } = field.kind() {
            out.extend(std::iter::repeat(field.get(*ty)).take(names.len().max(1)));
        }
    }
    out
}

/// Name of the first parameter, if it has one.
#[must_use]
pub fn first_param_name(list: NodeRef<'_>) -> Option<&str> {
    list.children().find_map(|field| match field.kind() {
        NodeKind::Field { names, .. } => names.first().and_then(|n| field.get(*n).ident()),
        _ => None,
    })
}

/// Go's exported-name rule.
#[must_use]
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Return statements that belong to a function body, skipping nested
/// function literals.
#[must_use]
pub fn own_returns(body: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut returns = Vec::new();
    walk(body, |node| match node.kind() {
        NodeKind::FuncLit(_) => false,
        NodeKind::ReturnStmt { .. } => {
            returns.push(node);
            true
        }
        _ => true,
    });
    returns
}

#[cfg(test)]
mod tests {
    use super::*;
    use goarch_lint_core::{NodeTag, SourceFile, SyntaxTree};
    use goarch_lint_go::GoParser;
    use std::path::Path;

    fn parse(src: &str) -> SyntaxTree {
        GoParser::new()
            .parse(SourceFile::new(Path::new("x.go"), src, Path::new(".")))
            .expect("parse")
    }

    #[test]
    fn callee_names_cover_calls_and_methods() {
        let tree = parse("package x\n\nfunc f() { a(); b.C(d()) }\n");
        assert_eq!(callee_names(tree.root()), ["a", "C", "d"]);
    }

    #[test]
    fn counts_grouped_parameters() {
        let tree = parse("package x\n\nfunc f(a, b int, c string) {}\n");
        let func = find_all(tree.root(), |n| n.kind().tag() == NodeTag::FuncDecl)[0];
        let parts = func.kind().func_parts().expect("parts");
        let params = Some(func.get(parts.params));
        assert_eq!(field_count(params), 3);
        assert_eq!(field_types(params).len(), 3);
        assert_eq!(first_param_name(func.get(parts.params)), Some("a"));
    }

    #[test]
    fn unquotes_string_literals() {
        let tree = parse("package x\n\nvar s = \"hi\"\nvar r = `raw`\n");
        let values: Vec<&str> = find_all(tree.root(), |n| n.kind().tag() == NodeTag::BasicLit)
            .into_iter()
            .filter_map(string_value)
            .collect();
        assert_eq!(values, ["hi", "raw"]);
    }

    #[test]
    fn own_returns_skip_closures() {
        let tree = parse(
            "package x\n\nfunc f() error {\n\tg := func() error { return nil }\n\t_ = g\n\treturn nil\n}\n",
        );
        let func = find_all(tree.root(), |n| n.kind().tag() == NodeTag::FuncDecl)[0];
        let body = func.kind().func_parts().and_then(|p| p.body).expect("body");
        assert_eq!(own_returns(func.get(body)).len(), 1);
    }
}
