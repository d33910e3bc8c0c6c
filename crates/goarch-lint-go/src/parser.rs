//! Lowers a tree-sitter-go concrete syntax tree into the core arena.
//!
//! Comments and anonymous tokens are dropped. Wrapper nodes that only group
//! siblings (`statement_list`, `expression_list`, `argument_list`, ...) are
//! flattened into their parent. Constructs without a dedicated
//! [`NodeKind`] variant are kept as [`NodeKind::Other`] with the grammar's
//! kind name.

use goarch_lint_core::{
    FrontendError, FuncParts, LitKind, NodeId, NodeKind, SourceFile, Span, SyntaxTree,
    TreeBuilder,
};
use tree_sitter::{Language, Node, Parser};

/// Grammar nodes whose children are spliced into the parent.
const FLATTENED: &[&str] = &[
    "statement_list",
    "expression_list",
    "argument_list",
    "import_spec_list",
    "var_spec_list",
    "literal_element",
];

/// A lowered child with the grammar field it was found under.
#[derive(Debug, Clone, Copy)]
struct Child {
    field: Option<&'static str>,
    kind: &'static str,
    span: Span,
    id: NodeId,
}

fn field(children: &[Child], name: &str) -> Option<NodeId> {
    children
        .iter()
        .find(|c| c.field == Some(name))
        .map(|c| c.id)
}

fn fields(children: &[Child], name: &str) -> Vec<NodeId> {
    children
        .iter()
        .filter(|c| c.field == Some(name))
        .map(|c| c.id)
        .collect()
}

fn span_of(node: Node<'_>) -> Span {
    Span::new(node.start_byte(), node.end_byte())
}

fn unquote(text: &str) -> String {
    text.trim_matches(|c| c == '"' || c == '`').to_string()
}

/// Parses Go source with tree-sitter.
pub struct GoParser {
    language: Language,
}

impl GoParser {
    /// Creates a parser for the Go grammar.
    #[must_use]
    pub fn new() -> Self {
        Self {
            language: tree_sitter_go::LANGUAGE.into(),
        }
    }

    /// Parses and lowers one file.
    ///
    /// # Errors
    ///
    /// Returns [`FrontendError::Syntax`] at the first error node, or
    /// [`FrontendError::Setup`] if the grammar cannot be loaded.
    pub fn parse(&self, file: SourceFile) -> Result<SyntaxTree, FrontendError> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| FrontendError::Setup(e.to_string()))?;

        let cst = parser
            .parse(file.content(), None)
            .ok_or_else(|| FrontendError::Setup("parser returned no tree".to_string()))?;
        let root = cst.root_node();
        if root.has_error() {
            let at = first_error(root).unwrap_or(root);
            let pos = at.start_position();
            return Err(FrontendError::Syntax {
                line: pos.row + 1,
                column: pos.column + 1,
            });
        }

        let builder = {
            let mut lowerer = Lowerer {
                src: file.content(),
                builder: TreeBuilder::new(),
            };
            lowerer.lower(root);
            lowerer.builder
        };
        Ok(builder.finish(file)?)
    }
}

impl Default for GoParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First error or missing node in document order.
fn first_error(root: Node<'_>) -> Option<Node<'_>> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
    None
}

struct Lowerer<'s> {
    src: &'s str,
    builder: TreeBuilder,
}

impl Lowerer<'_> {
    fn text(&self, node: Node<'_>) -> &str {
        self.src.get(node.start_byte()..node.end_byte()).unwrap_or("")
    }

    fn span_text(&self, span: Span) -> &str {
        self.src.get(span.start..span.end).unwrap_or("")
    }

    /// Lowers the named, non-comment children of `node`, splicing wrappers.
    fn lower_children(&mut self, node: Node<'_>, inherited: Option<&'static str>) -> Vec<Child> {
        let mut out = Vec::new();
        let mut cursor = node.walk();
        if !cursor.goto_first_child() {
            return out;
        }
        loop {
            let child = cursor.node();
            let field = cursor.field_name().or(inherited);
            if child.is_named() && !child.is_extra() && child.kind() != "comment" {
                let splice = FLATTENED.contains(&child.kind())
                    || (child.kind() == "literal_value" && node.kind() == "composite_literal");
                if splice {
                    out.extend(self.lower_children(child, field));
                } else {
                    let id = self.lower(child);
                    out.push(Child {
                        field,
                        kind: child.kind(),
                        span: span_of(child),
                        id,
                    });
                }
            }
            if !cursor.goto_next_sibling() {
                break;
            }
        }
        out
    }

    fn lower(&mut self, node: Node<'_>) -> NodeId {
        let kind = node.kind();
        let span = span_of(node);

        if let Some(leaf) = self.leaf(node) {
            return self.builder.push(leaf, span, vec![]);
        }

        let mut children = self.lower_children(node, None);
        let lowered = match kind {
            "source_file" => Some(NodeKind::File),
            "package_clause" => children.first().map(|c| NodeKind::PackageClause {
                name: self.span_text(c.span).to_string(),
            }),
            "import_declaration" => Some(NodeKind::ImportDecl),
            "import_spec" => field(&children, "path").map(|_| NodeKind::ImportSpec {
                path: children
                    .iter()
                    .find(|c| c.field == Some("path"))
                    .map(|c| unquote(self.span_text(c.span)))
                    .unwrap_or_default(),
                alias: children
                    .iter()
                    .find(|c| c.field == Some("name"))
                    .map(|c| self.span_text(c.span).to_string()),
            }),
            "function_declaration" | "method_declaration" | "func_literal" => {
                self.wrap_result(&mut children);
                field(&children, "parameters").map(|params| {
                    let parts = FuncParts {
                        name: field(&children, "name"),
                        recv: field(&children, "receiver"),
                        params,
                        results: field(&children, "result"),
                        body: field(&children, "body"),
                    };
                    if kind == "func_literal" {
                        NodeKind::FuncLit(parts)
                    } else {
                        NodeKind::FuncDecl(parts)
                    }
                })
            }
            "parameter_list" | "field_declaration_list" => Some(NodeKind::FieldList),
            "parameter_declaration" | "variadic_parameter_declaration" => {
                field(&children, "type").map(|ty| NodeKind::Field {
                    names: fields(&children, "name"),
                    ty,
                    tag: None,
                })
            }
            "field_declaration" => {
                self.wrap_embedded_pointer(node, &mut children);
                field(&children, "type").map(|ty| NodeKind::Field {
                    names: fields(&children, "name"),
                    ty,
                    tag: children
                        .iter()
                        .find(|c| c.field == Some("tag"))
                        .map(|c| self.span_text(c.span).to_string()),
                })
            }
            "type_declaration" => Some(NodeKind::TypeDecl),
            "type_spec" | "type_alias" => match (field(&children, "name"), field(&children, "type")) {
                (Some(name), Some(ty)) => Some(NodeKind::TypeSpec { name, ty }),
                _ => None,
            },
            "const_declaration" => Some(NodeKind::ConstDecl),
            "var_declaration" => Some(NodeKind::VarDecl),
            "const_spec" | "var_spec" => Some(NodeKind::ValueSpec {
                names: fields(&children, "name"),
                ty: field(&children, "type"),
                values: fields(&children, "value"),
            }),
            "struct_type" => children
                .iter()
                .find(|c| c.kind == "field_declaration_list")
                .map(|c| NodeKind::StructType { fields: c.id }),
            "interface_type" => Some(NodeKind::InterfaceType {
                elems: children.iter().map(|c| c.id).collect(),
            }),
            "method_elem" | "method_spec" => {
                self.wrap_result(&mut children);
                match (field(&children, "name"), field(&children, "parameters")) {
                    (Some(name), Some(params)) => Some(NodeKind::MethodSpec {
                        name,
                        params,
                        results: field(&children, "result"),
                    }),
                    _ => None,
                }
            }
            "pointer_type" => children
                .first()
                .map(|c| NodeKind::PointerType { elem: c.id }),
            "function_type" => {
                self.wrap_result(&mut children);
                field(&children, "parameters").map(|params| NodeKind::FuncType {
                    params,
                    results: field(&children, "result"),
                })
            }
            "block" => Some(NodeKind::Block),
            "return_statement" => Some(NodeKind::ReturnStmt {
                results: children.iter().map(|c| c.id).collect(),
            }),
            "expression_statement" => Some(NodeKind::ExprStmt),
            "assignment_statement" | "short_var_declaration" => Some(NodeKind::AssignStmt {
                lhs: fields(&children, "left"),
                rhs: fields(&children, "right"),
                define: kind == "short_var_declaration",
            }),
            "if_statement" => match (field(&children, "condition"), field(&children, "consequence")) {
                (Some(cond), Some(then)) => Some(NodeKind::IfStmt {
                    init: field(&children, "initializer"),
                    cond,
                    then,
                    els: field(&children, "alternative"),
                }),
                _ => None,
            },
            "call_expression" => field(&children, "function").map(|fun| NodeKind::CallExpr {
                fun,
                args: fields(&children, "arguments"),
            }),
            "selector_expression" => {
                match (field(&children, "operand"), field(&children, "field")) {
                    (Some(operand), Some(name)) => Some(NodeKind::SelectorExpr {
                        operand,
                        field: name,
                    }),
                    _ => None,
                }
            }
            "qualified_type" => match (field(&children, "package"), field(&children, "name")) {
                (Some(operand), Some(name)) => Some(NodeKind::SelectorExpr {
                    operand,
                    field: name,
                }),
                _ => None,
            },
            "composite_literal" => Some(NodeKind::CompositeLit {
                ty: field(&children, "type"),
                elements: fields(&children, "body"),
            }),
            "literal_value" => Some(NodeKind::CompositeLit {
                ty: None,
                elements: children.iter().map(|c| c.id).collect(),
            }),
            "keyed_element" => match children.as_slice() {
                [key, value] => Some(NodeKind::KeyValue {
                    key: key.id,
                    value: value.id,
                }),
                _ => None,
            },
            "unary_expression" => match (node.child_by_field_name("operator"), field(&children, "operand")) {
                (Some(op), Some(operand)) => Some(NodeKind::UnaryExpr {
                    op: self.text(op).to_string(),
                    operand,
                }),
                _ => None,
            },
            _ => None,
        };

        let kind = lowered.unwrap_or_else(|| NodeKind::Other {
            kind: kind.to_string(),
        });
        let ids = children.iter().map(|c| c.id).collect();
        self.builder.push(kind, span, ids)
    }

    /// Lowers tokens that have no interesting children.
    fn leaf(&self, node: Node<'_>) -> Option<NodeKind> {
        let lit = |kind| {
            Some(NodeKind::BasicLit {
                kind,
                value: self.text(node).to_string(),
            })
        };
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "package_identifier"
            | "label_name" | "blank_identifier" | "dot" | "nil" | "true" | "false" | "iota" => {
                Some(NodeKind::Ident {
                    name: self.text(node).to_string(),
                })
            }
            "int_literal" => lit(LitKind::Int),
            "float_literal" => lit(LitKind::Float),
            "imaginary_literal" => lit(LitKind::Imaginary),
            "rune_literal" => lit(LitKind::Rune),
            "interpreted_string_literal" => lit(LitKind::String),
            "raw_string_literal" => lit(LitKind::RawString),
            _ => None,
        }
    }

    /// Wraps a bare result type (`func f() error`) in a one-field list so
    /// results are always a [`NodeKind::FieldList`].
    fn wrap_result(&mut self, children: &mut [Child]) {
        let Some(result) = children
            .iter_mut()
            .find(|c| c.field == Some("result") && c.kind != "parameter_list")
        else {
            return;
        };
        let field = self.builder.push(
            NodeKind::Field {
                names: Vec::new(),
                ty: result.id,
                tag: None,
            },
            result.span,
            vec![result.id],
        );
        result.id = self
            .builder
            .push(NodeKind::FieldList, result.span, vec![field]);
        result.kind = "parameter_list";
    }

    /// Turns an embedded `*T` field's type into a pointer type.
    fn wrap_embedded_pointer(&mut self, node: Node<'_>, children: &mut [Child]) {
        let mut cursor = node.walk();
        let Some(star) = node.children(&mut cursor).next().filter(|c| c.kind() == "*") else {
            return;
        };
        let Some(ty) = children.iter_mut().find(|c| c.field == Some("type")) else {
            return;
        };
        let span = Span::new(star.start_byte(), ty.span.end);
        ty.id = self
            .builder
            .push(NodeKind::PointerType { elem: ty.id }, span, vec![ty.id]);
        ty.kind = "pointer_type";
        ty.span = span;
    }
}
