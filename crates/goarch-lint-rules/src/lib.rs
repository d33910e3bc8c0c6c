//! # goarch-lint-rules
//!
//! Built-in architecture rules for Go services.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | GA000 | `tree-index` | Prerequisite: node ids grouped by kind |
//! | GA100 | `decl-index` | Prerequisite: type and function declarations |
//! | GA001 | `api-handler` | HTTP handlers validate input, handle errors, use the request context |
//! | GA002 | `middleware-chain` | Middleware preserves the context and calls the next handler |
//! | GA003 | `domain-layering` | Domain entities live in `domain` packages with a `Validate` method |
//! | GA004 | `interface-contract` | Small interfaces named `...er` or `...Service` |
//! | GA005 | `storage-shape` | Stores wrap domain errors and support transactions |
//! | GA006 | `error-wrapping` | Returned errors carry context |
//! | GA007 | `interface-location` | Interfaces are declared in `interfaces.go` |
//! | GA008 | `structured-logging` | Structured, leveled logging, errors logged before returning |
//! | GA009 | `task-fields` | Task field names and Unix timestamps |
//! | GA010 | `style-limits` | Size, naming and import-order limits |
//!
//! ## Usage
//!
//! ```ignore
//! use goarch_lint_core::Analyzer;
//! use goarch_lint_go::GoFrontend;
//! use goarch_lint_rules::{registry, Preset};
//!
//! let analyzer = Analyzer::builder()
//!     .root("./internal")
//!     .frontend(GoFrontend::detect(".".as_ref()))
//!     .registry(registry(Preset::Recommended.rules()))
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api_handler;
pub mod decl_index;
mod domain_layering;
mod error_wrapping;
mod interface_contract;
mod interface_location;
mod middleware_chain;
mod presets;
mod storage_shape;
mod structured_logging;
mod style_limits;
mod task_fields;
pub mod tree_index;
pub mod util;

pub use api_handler::ApiHandler;
pub use decl_index::{DeclIndex, Declarations};
pub use domain_layering::DomainLayering;
pub use error_wrapping::ErrorWrapping;
pub use interface_contract::InterfaceContract;
pub use interface_location::InterfaceLocation;
pub use middleware_chain::MiddlewareChain;
pub use presets::{all_rules, registry, rules_from_config, Preset};
pub use storage_shape::StorageShape;
pub use structured_logging::StructuredLogging;
pub use style_limits::{StyleLimits, StyleLimitsConfig};
pub use task_fields::TaskFields;
pub use tree_index::{NodeIndex, TreeIndex};

/// Re-export core types for convenience.
pub use goarch_lint_core::{Diagnostic, Rule, Severity};

#[cfg(test)]
pub(crate) mod testing {
    use goarch_lint_core::{
        Analyzer, CompilationUnit, Diagnostic, Frontend, Registry, Rule, SourceFile,
    };
    use goarch_lint_go::GoFrontend;
    use std::path::Path;

    const ROOT: &str = "/project";

    /// Loads `src` as if it lived at `path` inside module `example.com/app`.
    pub(crate) fn unit(path: &str, src: &str) -> CompilationUnit {
        let root = Path::new(ROOT);
        let file = SourceFile::new(&root.join(path), src, root);
        GoFrontend::new()
            .with_module("example.com/app")
            .load(file)
            .expect("test source should parse")
    }

    /// Runs `rule` with its prerequisite passes over one file.
    pub(crate) fn check<R: Rule + 'static>(rule: R, path: &str, src: &str) -> Vec<Diagnostic> {
        let mut registry = Registry::new();
        registry.register(crate::TreeIndex::new());
        registry.register(crate::DeclIndex::new());
        registry.register(rule);
        let analyzer = Analyzer::builder()
            .root(ROOT)
            .registry(registry)
            .build()
            .expect("analyzer");
        analyzer.run_unit(&unit(path, src))
    }
}
