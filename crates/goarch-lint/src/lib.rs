//! # goarch-lint
//!
//! Multi-pass architecture linter for Go services.
//!
//! This is the facade crate: it re-exports the core framework, the Go
//! front-end and the built-in rules, and adds one-call entry points.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let result = goarch_lint::lint_project("./")?;
//! for diagnostic in &result.diagnostics {
//!     println!("{diagnostic}");
//! }
//! ```
//!
//! The project's `goarch-lint.toml` selects the preset and rule options; the
//! module path is read from `go.mod` unless configured.
//!
//! ## Single Files
//!
//! ```
//! let diagnostics = goarch_lint::lint_source(
//!     "internal/store/store.go",
//!     "package store\n\ntype TaskStore interface{ Get() }\n",
//!     Some("example.com/todo"),
//! )
//! .expect("valid Go");
//! assert!(diagnostics.iter().any(|d| d.rule == "interface-location"));
//! ```
//!
//! ## Suppression Comments
//!
//! ```go
//! // goarch-lint:allow(interface-location) reason="generated mock"
//! type TaskStore interface { Get() }
//! ```
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use goarch_lint::rules::{registry, Preset};
//! use goarch_lint::{Analyzer, GoFrontend};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./")
//!     .frontend(GoFrontend::detect("./".as_ref()))
//!     .registry(registry(Preset::Architecture.rules()))
//!     .build()?;
//!
//! let result = analyzer.analyze()?;
//! ```

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use goarch_lint_core::*;

pub use goarch_lint_go::{GoFrontend, GoParser};

/// Built-in rules and presets.
pub mod rules {
    pub use goarch_lint_rules::*;
}

mod runner;

pub use runner::{lint_project, lint_source, lint_source_with, load_config, LintError};
