//! Tree traversal with an explicit ancestor stack.
//!
//! Traversal is an iterative pre-order walk, so deeply nested input cannot
//! overflow the call stack.

use crate::tree::{NodeKind, NodeRef, NodeTag};

/// Walks the subtree rooted at `root` in pre-order.
///
/// `visit` returns `false` to skip the children of the current node.
pub fn walk<'t, F>(root: NodeRef<'t>, mut visit: F)
where
    F: FnMut(NodeRef<'t>) -> bool,
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) {
            stack.extend(node.children().rev());
        }
    }
}

/// Enclosing nodes of the node currently visited, outermost first.
#[derive(Debug, Default)]
pub struct Ancestors<'t> {
    stack: Vec<NodeRef<'t>>,
}

impl<'t> Ancestors<'t> {
    /// Direct parent, `None` for the walk root.
    #[must_use]
    pub fn parent(&self) -> Option<NodeRef<'t>> {
        self.stack.last().copied()
    }

    /// Ancestors from nearest to outermost.
    pub fn iter(&self) -> impl Iterator<Item = NodeRef<'t>> + '_ {
        self.stack.iter().rev().copied()
    }

    /// Nearest ancestor satisfying `pred`.
    pub fn nearest<P>(&self, mut pred: P) -> Option<NodeRef<'t>>
    where
        P: FnMut(NodeRef<'t>) -> bool,
    {
        self.iter().find(|n| pred(*n))
    }

    /// Nearest enclosing function declaration or literal.
    #[must_use]
    pub fn enclosing_function(&self) -> Option<NodeRef<'t>> {
        self.nearest(|n| matches!(n.kind(), NodeKind::FuncDecl(_) | NodeKind::FuncLit(_)))
    }

    /// Nearest enclosing block.
    #[must_use]
    pub fn enclosing_block(&self) -> Option<NodeRef<'t>> {
        self.nearest(|n| n.kind().tag() == NodeTag::Block)
    }

    /// Nearest enclosing top-level or nested declaration.
    #[must_use]
    pub fn enclosing_declaration(&self) -> Option<NodeRef<'t>> {
        self.nearest(|n| {
            matches!(
                n.kind().tag(),
                NodeTag::FuncDecl
                    | NodeTag::TypeDecl
                    | NodeTag::TypeSpec
                    | NodeTag::ConstDecl
                    | NodeTag::VarDecl
            )
        })
    }

    /// Number of ancestors.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

/// Walks like [`walk`], passing the ancestor stack of every visited node.
pub fn walk_with_ancestors<'t, F>(root: NodeRef<'t>, mut visit: F)
where
    F: FnMut(NodeRef<'t>, &Ancestors<'t>) -> bool,
{
    let mut ancestors = Ancestors::default();
    let mut stack = vec![(root, 0usize)];
    while let Some((node, depth)) = stack.pop() {
        ancestors.stack.truncate(depth);
        if visit(node, &ancestors) {
            ancestors.stack.push(node);
            stack.extend(node.children().rev().map(|c| (c, depth + 1)));
        }
    }
}

/// All nodes below `root` (excluding it), in pre-order.
#[must_use]
pub fn descendants(root: NodeRef<'_>) -> Vec<NodeRef<'_>> {
    let mut out = Vec::new();
    walk(root, |n| {
        if n.id() != root.id() {
            out.push(n);
        }
        true
    });
    out
}

/// Nodes of the subtree (including `root`) satisfying `pred`, in pre-order.
pub fn find_all<'t, P>(root: NodeRef<'t>, mut pred: P) -> Vec<NodeRef<'t>>
where
    P: FnMut(NodeRef<'t>) -> bool,
{
    let mut out = Vec::new();
    walk(root, |n| {
        if pred(n) {
            out.push(n);
        }
        true
    });
    out
}
