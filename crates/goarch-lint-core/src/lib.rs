//! # goarch-lint-core
//!
//! Core framework for multi-pass architecture linting of Go syntax trees.
//!
//! This crate provides the foundational traits and types for building
//! architecture linters. It includes:
//!
//! - [`SyntaxTree`], an arena of [`NodeKind`] nodes, and the [`visit`] walkers
//! - [`SemanticBridge`] over a pre-computed [`FactTable`]
//! - [`Rule`] and [`Registry`] for declaring rules and their prerequisites
//! - [`Analyzer`] for running rules per [`CompilationUnit`]
//! - [`Diagnostic`] and [`SuggestedFix`] for reporting findings and edits
//!
//! ## Example
//!
//! ```ignore
//! use goarch_lint_core::Analyzer;
//!
//! let analyzer = Analyzer::builder()
//!     .root("./internal")
//!     .frontend(my_frontend)
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! println!("{} findings", result.diagnostics.len());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod analyzer;
mod config;
mod context;
pub mod fix;
mod registry;
mod rule;
pub mod semantic;
pub mod tree;
mod types;
pub mod visit;

/// Utility modules for rule implementations.
pub mod utils;

pub use analyzer::{Analyzer, AnalyzerBuilder, AnalyzerError, CancellationToken};
pub use config::{AnalyzerConfig, Config, ConfigError, RuleConfig};
pub use context::{CompilationUnit, Frontend, FrontendError, LineIndex, SourceFile};
pub use fix::{apply_fix, apply_fixes, plan_fixes, FixBuilder, FixError, FixPlan};
pub use registry::{GraphError, PassGraph, Registry, Scheduled};
pub use rule::{Capabilities, FnRule, Pass, Rule, RuleBox, RuleError};
pub use semantic::{FactTable, Method, MethodSet, ReceiverKind, SemanticBridge, Type};
pub use tree::{
    FuncParts, LitKind, NodeCategory, NodeId, NodeKind, NodeRef, NodeTag, Span, SyntaxTree,
    TreeBuilder, TreeError,
};
pub use types::{
    Diagnostic, DiagnosticKind, LintResult, Location, ReportDiagnostic, Severity, SuggestedFix,
    TextEdit,
};
pub use utils::allowance::AllowCheck;
