//! Source files, compilation units and the front-end seam.

use crate::semantic::{FactTable, SemanticBridge};
use crate::tree::{NodeId, Span, SyntaxTree};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Line start offsets of a file, for offset → line/column conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    /// Indexes `content`.
    #[must_use]
    pub fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            content
                .bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self { starts }
    }

    /// Converts a byte offset to a 1-indexed `(line, column)` pair.
    ///
    /// Columns count bytes, like Go's `token.Position`.
    #[must_use]
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.starts.binary_search(&offset) {
            Ok(exact) => exact,
            Err(next) => next - 1,
        };
        (line + 1, offset - self.starts[line] + 1)
    }

    /// Byte offset of the start of a 1-indexed line.
    #[must_use]
    pub fn line_start(&self, line: usize) -> Option<usize> {
        self.starts.get(line.checked_sub(1)?).copied()
    }
}

#[derive(Debug)]
struct SourceInner {
    path: PathBuf,
    relative_path: PathBuf,
    content: String,
    lines: LineIndex,
}

/// A source file shared by its tree, its unit and its diagnostics.
///
/// Cloning is cheap.
#[derive(Debug, Clone)]
pub struct SourceFile {
    inner: Arc<SourceInner>,
}

impl SourceFile {
    /// Creates a source file; `relative_path` is computed against `root`.
    #[must_use]
    pub fn new(path: &Path, content: impl Into<String>, root: &Path) -> Self {
        let content = content.into();
        let relative_path = path
            .strip_prefix(root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf);
        Self {
            inner: Arc::new(SourceInner {
                path: path.to_path_buf(),
                relative_path,
                lines: LineIndex::new(&content),
                content,
            }),
        }
    }

    /// Path as discovered.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Path relative to the analysis root.
    #[must_use]
    pub fn relative_path(&self) -> &Path {
        &self.inner.relative_path
    }

    /// File name component, or `""`.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.inner
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Full file content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.inner.content
    }

    /// Line index of the content.
    #[must_use]
    pub fn lines(&self) -> &LineIndex {
        &self.inner.lines
    }

    /// Whether this is a Go test file.
    #[must_use]
    pub fn is_test(&self) -> bool {
        self.file_name().ends_with("_test.go")
    }

    /// Leading whitespace of the line containing `offset`.
    #[must_use]
    pub fn indent_at(&self, offset: usize) -> &str {
        let (line, _) = self.inner.lines.line_col(offset);
        let start = self.inner.lines.line_start(line).unwrap_or(0);
        let rest = self.inner.content.get(start..).unwrap_or("");
        let width = rest
            .bytes()
            .take_while(|b| *b == b' ' || *b == b'\t')
            .count();
        &rest[..width]
    }
}

/// One parsed file plus its semantic facts.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    tree: SyntaxTree,
    facts: FactTable,
    module: Option<String>,
}

impl CompilationUnit {
    /// Creates a unit from a tree and its facts.
    #[must_use]
    pub fn new(tree: SyntaxTree, facts: FactTable) -> Self {
        Self {
            tree,
            facts,
            module: None,
        }
    }

    /// Sets the project module prefix (e.g. `github.com/acme/todo`).
    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Syntax tree.
    #[must_use]
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Source file.
    #[must_use]
    pub fn file(&self) -> &SourceFile {
        self.tree.file()
    }

    /// Semantic facts.
    #[must_use]
    pub fn semantics(&self) -> &dyn SemanticBridge {
        &self.facts
    }

    /// Project module prefix, if known.
    #[must_use]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    /// Import path of the unit's package, if known.
    #[must_use]
    pub fn package_path(&self) -> Option<&str> {
        self.facts.package_path(self.tree.root().id())
    }

    /// Source text of a span.
    #[must_use]
    pub fn text(&self, span: Span) -> &str {
        self.tree.text(span)
    }

    /// Text of a node.
    #[must_use]
    pub fn node_text(&self, id: NodeId) -> &str {
        self.tree.node(id).text()
    }
}

/// Errors raised by a front-end while loading a file.
#[derive(Debug, Error)]
pub enum FrontendError {
    /// The parser could not be set up.
    #[error("front-end setup failed: {0}")]
    Setup(String),
    /// The source is not syntactically valid.
    #[error("syntax error at {line}:{column}")]
    Syntax {
        /// 1-indexed line.
        line: usize,
        /// 1-indexed column.
        column: usize,
    },
    /// The lowered tree violated an arena invariant.
    #[error("invalid syntax tree: {0}")]
    Tree(#[from] crate::tree::TreeError),
}

/// Parser and type-checker front-end producing compilation units.
///
/// This is the seam to the external parser: the engine never reads files
/// through any other path.
pub trait Frontend: Send + Sync {
    /// Language identifier (e.g. `"go"`).
    fn language_id(&self) -> &'static str;

    /// File extensions handled, with leading dot.
    fn extensions(&self) -> &'static [&'static str];

    /// Parses and resolves one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed.
    fn load(&self, file: SourceFile) -> Result<CompilationUnit, FrontendError>;
}
