//! Arena-backed syntax tree.
//!
//! Nodes live in a flat arena owned by [`SyntaxTree`] and are addressed by
//! [`NodeId`]. A node stores only its children; parent queries go through the
//! ancestor stack of [`crate::visit::walk_with_ancestors`].

use crate::context::SourceFile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Returns the arena index of this node.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Half-open byte range `[start, end)` into the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset.
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a new span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true for zero-width spans.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Returns true if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Literal flavours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    /// Integer literal.
    Int,
    /// Floating point literal.
    Float,
    /// Imaginary literal.
    Imaginary,
    /// Rune literal.
    Rune,
    /// Interpreted (`"..."`) string literal.
    String,
    /// Raw (`` `...` ``) string literal.
    RawString,
}

impl LitKind {
    /// Returns true for both string literal flavours.
    #[must_use]
    pub fn is_string(self) -> bool {
        matches!(self, Self::String | Self::RawString)
    }
}

/// Shape shared by function declarations and function literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncParts {
    /// Name identifier (absent for literals).
    pub name: Option<NodeId>,
    /// Receiver field list (methods only).
    pub recv: Option<NodeId>,
    /// Parameter field list.
    pub params: NodeId,
    /// Result field list, if the function returns anything.
    pub results: Option<NodeId>,
    /// Body block (absent for external declarations).
    pub body: Option<NodeId>,
}

/// Closed enumeration of node kinds.
///
/// Children referenced by a variant are also listed, in source order, in the
/// node's child list. Constructs the engine does not inspect structurally are
/// kept as [`NodeKind::Other`] so traversal still reaches everything below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a file.
    File,
    /// `package name`.
    PackageClause {
        /// Declared package name.
        name: String,
    },
    /// `import ...` declaration (single or grouped).
    ImportDecl,
    /// A single import path with optional alias.
    ImportSpec {
        /// Unquoted import path.
        path: String,
        /// Alias, `_` or `.` when present.
        alias: Option<String>,
    },
    /// Function or method declaration.
    FuncDecl(FuncParts),
    /// `type ...` declaration (single or grouped).
    TypeDecl,
    /// `Name T` inside a type declaration.
    TypeSpec {
        /// Name identifier.
        name: NodeId,
        /// Type expression.
        ty: NodeId,
    },
    /// `const ...` declaration.
    ConstDecl,
    /// `var ...` declaration.
    VarDecl,
    /// Names, optional type and values of a const/var spec.
    ValueSpec {
        /// Declared name identifiers.
        names: Vec<NodeId>,
        /// Declared type, if written.
        ty: Option<NodeId>,
        /// Initial values.
        values: Vec<NodeId>,
    },
    /// Parameter, result, receiver or struct field list.
    FieldList,
    /// One entry of a field list; embedded fields have no names.
    Field {
        /// Name identifiers.
        names: Vec<NodeId>,
        /// Field type.
        ty: NodeId,
        /// Raw struct tag text.
        tag: Option<String>,
    },
    /// `struct { ... }`.
    StructType {
        /// Field list node.
        fields: NodeId,
    },
    /// `interface { ... }`.
    InterfaceType {
        /// Method specs and embedded types, in order.
        elems: Vec<NodeId>,
    },
    /// Method inside an interface.
    MethodSpec {
        /// Method name identifier.
        name: NodeId,
        /// Parameter field list.
        params: NodeId,
        /// Result field list.
        results: Option<NodeId>,
    },
    /// `*T`.
    PointerType {
        /// Pointee type.
        elem: NodeId,
    },
    /// `func(...) ...` as a type.
    FuncType {
        /// Parameter field list.
        params: NodeId,
        /// Result field list.
        results: Option<NodeId>,
    },
    /// `{ ... }` statement block.
    Block,
    /// `return ...`.
    ReturnStmt {
        /// Returned expressions.
        results: Vec<NodeId>,
    },
    /// Expression used as a statement.
    ExprStmt,
    /// `=`, `op=` or `:=` assignment.
    AssignStmt {
        /// Left-hand side expressions.
        lhs: Vec<NodeId>,
        /// Right-hand side expressions.
        rhs: Vec<NodeId>,
        /// True for `:=`.
        define: bool,
    },
    /// `if` statement.
    IfStmt {
        /// Init statement.
        init: Option<NodeId>,
        /// Condition expression.
        cond: NodeId,
        /// Then block.
        then: NodeId,
        /// Else block or chained `if`.
        els: Option<NodeId>,
    },
    /// Identifier of any flavour (value, type, field, package).
    Ident {
        /// Identifier text.
        name: String,
    },
    /// Literal token.
    BasicLit {
        /// Literal flavour.
        kind: LitKind,
        /// Source text, quotes included.
        value: String,
    },
    /// `f(args)`.
    CallExpr {
        /// Callee expression.
        fun: NodeId,
        /// Argument expressions.
        args: Vec<NodeId>,
    },
    /// `x.f`, also used for qualified types `pkg.T`.
    SelectorExpr {
        /// Operand expression.
        operand: NodeId,
        /// Selected identifier.
        field: NodeId,
    },
    /// `T{...}`.
    CompositeLit {
        /// Literal type, absent for elided inner literals.
        ty: Option<NodeId>,
        /// Element expressions or key/value pairs.
        elements: Vec<NodeId>,
    },
    /// `key: value` inside a composite literal.
    KeyValue {
        /// Key expression.
        key: NodeId,
        /// Value expression.
        value: NodeId,
    },
    /// `func(...) { ... }` expression.
    FuncLit(FuncParts),
    /// Prefix operator expression.
    UnaryExpr {
        /// Operator text.
        op: String,
        /// Operand expression.
        operand: NodeId,
    },
    /// Any construct without a dedicated variant.
    Other {
        /// Front-end specific kind name.
        kind: String,
    },
}

/// Coarse node category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeCategory {
    /// Top-level or nested declaration.
    Declaration,
    /// Statement.
    Statement,
    /// Expression.
    Expression,
    /// Type expression.
    Type,
    /// Identifier.
    Identifier,
    /// Structural or unclassified node.
    Other,
}

/// Fieldless mirror of [`NodeKind`] used for indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum NodeTag {
    File,
    PackageClause,
    ImportDecl,
    ImportSpec,
    FuncDecl,
    TypeDecl,
    TypeSpec,
    ConstDecl,
    VarDecl,
    ValueSpec,
    FieldList,
    Field,
    StructType,
    InterfaceType,
    MethodSpec,
    PointerType,
    FuncType,
    Block,
    ReturnStmt,
    ExprStmt,
    AssignStmt,
    IfStmt,
    Ident,
    BasicLit,
    CallExpr,
    SelectorExpr,
    CompositeLit,
    KeyValue,
    FuncLit,
    UnaryExpr,
    Other,
}

impl NodeKind {
    /// Returns the fieldless tag of this kind.
    #[must_use]
    pub fn tag(&self) -> NodeTag {
        match self {
            Self::File => NodeTag::File,
            Self::PackageClause { .. } => NodeTag::PackageClause,
            Self::ImportDecl => NodeTag::ImportDecl,
            Self::ImportSpec { .. } => NodeTag::ImportSpec,
            Self::FuncDecl(_) => NodeTag::FuncDecl,
            Self::TypeDecl => NodeTag::TypeDecl,
            Self::TypeSpec { .. } => NodeTag::TypeSpec,
            Self::ConstDecl => NodeTag::ConstDecl,
            Self::VarDecl => NodeTag::VarDecl,
            Self::ValueSpec { .. } => NodeTag::ValueSpec,
            Self::FieldList => NodeTag::FieldList,
            Self::Field { .. } => NodeTag::Field,
            Self::StructType { .. } => NodeTag::StructType,
            Self::InterfaceType { .. } => NodeTag::InterfaceType,
            Self::MethodSpec { .. } => NodeTag::MethodSpec,
            Self::PointerType { .. } => NodeTag::PointerType,
            Self::FuncType { .. } => NodeTag::FuncType,
            Self::Block => NodeTag::Block,
            Self::ReturnStmt { .. } => NodeTag::ReturnStmt,
            Self::ExprStmt => NodeTag::ExprStmt,
            Self::AssignStmt { .. } => NodeTag::AssignStmt,
            Self::IfStmt { .. } => NodeTag::IfStmt,
            Self::Ident { .. } => NodeTag::Ident,
            Self::BasicLit { .. } => NodeTag::BasicLit,
            Self::CallExpr { .. } => NodeTag::CallExpr,
            Self::SelectorExpr { .. } => NodeTag::SelectorExpr,
            Self::CompositeLit { .. } => NodeTag::CompositeLit,
            Self::KeyValue { .. } => NodeTag::KeyValue,
            Self::FuncLit(_) => NodeTag::FuncLit,
            Self::UnaryExpr { .. } => NodeTag::UnaryExpr,
            Self::Other { .. } => NodeTag::Other,
        }
    }

    /// Returns the coarse category of this kind.
    #[must_use]
    pub fn category(&self) -> NodeCategory {
        match self {
            Self::PackageClause { .. }
            | Self::ImportDecl
            | Self::ImportSpec { .. }
            | Self::FuncDecl(_)
            | Self::TypeDecl
            | Self::TypeSpec { .. }
            | Self::ConstDecl
            | Self::VarDecl
            | Self::ValueSpec { .. } => NodeCategory::Declaration,
            Self::Block
            | Self::ReturnStmt { .. }
            | Self::ExprStmt
            | Self::AssignStmt { .. }
            | Self::IfStmt { .. } => NodeCategory::Statement,
            Self::BasicLit { .. }
            | Self::CallExpr { .. }
            | Self::SelectorExpr { .. }
            | Self::CompositeLit { .. }
            | Self::KeyValue { .. }
            | Self::FuncLit(_)
            | Self::UnaryExpr { .. } => NodeCategory::Expression,
            Self::StructType { .. }
            | Self::InterfaceType { .. }
            | Self::MethodSpec { .. }
            | Self::PointerType { .. }
            | Self::FuncType { .. } => NodeCategory::Type,
            Self::Ident { .. } => NodeCategory::Identifier,
            Self::File | Self::FieldList | Self::Field { .. } | Self::Other { .. } => {
                NodeCategory::Other
            }
        }
    }

    /// Returns function parts for declarations and literals.
    #[must_use]
    pub fn func_parts(&self) -> Option<&FuncParts> {
        match self {
            Self::FuncDecl(parts) | Self::FuncLit(parts) => Some(parts),
            _ => None,
        }
    }
}

/// A node stored in the arena.
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    kind: NodeKind,
    span: Span,
    children: Vec<NodeId>,
}

impl SyntaxNode {
    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Byte span.
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// Children in source order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Errors raised when finishing a [`TreeBuilder`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TreeError {
    /// A child id does not refer to an earlier node.
    #[error("node {parent} references unknown child {child}")]
    DanglingChild {
        /// Parent index.
        parent: usize,
        /// Offending child index.
        child: usize,
    },
    /// A node was attached to more than one parent.
    #[error("node {child} has more than one parent")]
    SharedChild {
        /// Offending child index.
        child: usize,
    },
    /// A node other than the root has no parent.
    #[error("node {0} is unreachable from the root")]
    Orphan(usize),
    /// The builder holds no nodes.
    #[error("tree is empty")]
    Empty,
}

/// Builds a [`SyntaxTree`] children-first.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<SyntaxNode>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a node whose children were allocated before it.
    pub fn push(&mut self, kind: NodeKind, span: Span, children: Vec<NodeId>) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(SyntaxNode {
            kind,
            span,
            children,
        });
        id
    }

    /// Number of allocated nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if nothing was allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Finishes the tree, taking the last allocated node as root.
    ///
    /// # Errors
    ///
    /// Fails unless every non-root node has exactly one parent.
    pub fn finish(self, file: SourceFile) -> Result<SyntaxTree, TreeError> {
        let Some(last) = self.nodes.len().checked_sub(1) else {
            return Err(TreeError::Empty);
        };

        let mut parented = vec![false; self.nodes.len()];
        for (parent, node) in self.nodes.iter().enumerate() {
            for child in &node.children {
                let child = child.index();
                if child >= parent {
                    return Err(TreeError::DanglingChild { parent, child });
                }
                if parented[child] {
                    return Err(TreeError::SharedChild { child });
                }
                parented[child] = true;
            }
        }
        if let Some(orphan) = parented[..last].iter().position(|p| !p) {
            return Err(TreeError::Orphan(orphan));
        }

        Ok(SyntaxTree {
            file,
            nodes: self.nodes,
            root: NodeId(u32::try_from(last).unwrap_or(u32::MAX)),
        })
    }
}

/// Immutable syntax tree of one source file.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    file: SourceFile,
    nodes: Vec<SyntaxNode>,
    root: NodeId,
}

impl SyntaxTree {
    /// Source file the tree was parsed from.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        &self.file
    }

    /// Root node.
    #[must_use]
    pub fn root(&self) -> NodeRef<'_> {
        self.node(self.root)
    }

    /// Handle for a node id of this tree.
    ///
    /// # Panics
    ///
    /// Panics if `id` belongs to another tree and is out of range.
    #[must_use]
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        assert!(id.index() < self.nodes.len(), "node id out of range");
        NodeRef { tree: self, id }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree has no nodes (never the case once built).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Source text covered by `span`, or `""` when out of bounds.
    #[must_use]
    pub fn text(&self, span: Span) -> &str {
        self.file.content().get(span.start..span.end).unwrap_or("")
    }
}

/// Borrowed handle to a node together with its tree.
#[derive(Clone, Copy)]
pub struct NodeRef<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> NodeRef<'t> {
    fn raw(self) -> &'t SyntaxNode {
        &self.tree.nodes[self.id.index()]
    }

    /// Node id.
    #[must_use]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// Owning tree.
    #[must_use]
    pub fn tree(self) -> &'t SyntaxTree {
        self.tree
    }

    /// Source file of the owning tree.
    #[must_use]
    pub fn file(self) -> &'t SourceFile {
        &self.tree.file
    }

    /// Node kind.
    #[must_use]
    pub fn kind(self) -> &'t NodeKind {
        &self.raw().kind
    }

    /// Byte span.
    #[must_use]
    pub fn span(self) -> Span {
        self.raw().span
    }

    /// Source text of this node.
    #[must_use]
    pub fn text(self) -> &'t str {
        self.tree.text(self.span())
    }

    /// Children in source order.
    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'t>> + ExactSizeIterator {
        let tree = self.tree;
        self.raw()
            .children
            .iter()
            .map(move |&id| NodeRef { tree, id })
    }

    /// Another node of the same tree.
    #[must_use]
    pub fn get(self, id: NodeId) -> NodeRef<'t> {
        self.tree.node(id)
    }

    /// Identifier text if this is an [`NodeKind::Ident`].
    #[must_use]
    pub fn ident(self) -> Option<&'t str> {
        match self.kind() {
            NodeKind::Ident { name } => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{}..{}", self.kind().tag(), self.span().start, self.span().end)
    }
}
