//! # goarch-lint-go
//!
//! Go front-end for goarch-lint.
//!
//! Parses `.go` files with tree-sitter and lowers them into the core syntax
//! arena, then resolves the facts a single file can answer, plus the
//! receiver methods declared elsewhere in its package:
//!
//! - [`GoParser`] for parsing and lowering
//! - [`Resolver`] for declared types, method sets, import paths and the
//!   static types of locally typed expressions
//! - [`GoFrontend`], the [`goarch_lint_core::Frontend`] used by the analyzer
//!
//! # Example
//!
//! ```
//! use goarch_lint_core::{Frontend, SourceFile};
//! use goarch_lint_go::GoFrontend;
//! use std::path::Path;
//!
//! let root = Path::new("/project");
//! let file = SourceFile::new(&root.join("main.go"), "package main\n", root);
//! let unit = GoFrontend::new().load(file).unwrap();
//! assert_eq!(unit.tree().root().children().len(), 1);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod frontend;
pub mod parser;
pub mod resolver;

pub use frontend::GoFrontend;
pub use parser::GoParser;
pub use resolver::Resolver;
