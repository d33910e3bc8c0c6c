//! Rule trait and the per-unit pass handed to rules.

use crate::context::{CompilationUnit, SourceFile};
use crate::fix::FixError;
use crate::semantic::SemanticBridge;
use crate::tree::{Span, SyntaxTree};
use crate::types::{Diagnostic, Location, Severity};
use crate::utils::allowance::{check_allow_with_reason, AllowCheck};
use std::any::Any;
use std::collections::HashMap;
use thiserror::Error;

/// What a rule reads from a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Reads the syntax tree.
    pub syntax: bool,
    /// Reads semantic facts.
    pub semantics: bool,
}

impl Capabilities {
    /// Syntax only.
    pub const SYNTAX: Self = Self {
        syntax: true,
        semantics: false,
    };

    /// Syntax and semantic facts.
    pub const SEMANTIC: Self = Self {
        syntax: true,
        semantics: true,
    };
}

impl std::fmt::Display for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.syntax, self.semantics) {
            (_, true) => write!(f, "syntax+semantics"),
            (true, false) => write!(f, "syntax"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Errors a rule can return from [`Rule::run`].
#[derive(Debug, Error)]
pub enum RuleError {
    /// A prerequisite did not publish a result.
    #[error("`{rule}` requires a result from `{dependency}`, but none was published")]
    MissingResult {
        /// Requesting rule.
        rule: String,
        /// Prerequisite name.
        dependency: String,
    },
    /// A prerequisite published a result of another type.
    #[error("result of `{dependency}` has an unexpected type")]
    ResultType {
        /// Prerequisite name.
        dependency: String,
    },
    /// A fix could not be built.
    #[error("invalid fix: {0}")]
    Fix(#[from] FixError),
    /// Any other failure.
    #[error("{0}")]
    Failed(String),
}

/// A lint rule run once per compilation unit.
///
/// Rules are stateless across units. A rule may publish one typed result per
/// unit through [`Pass::set_result`] for the rules that list it in
/// [`Rule::requires`].
///
/// # Example
///
/// ```ignore
/// use goarch_lint_core::{Pass, Rule, RuleError};
///
/// pub struct NoInit;
///
/// impl Rule for NoInit {
///     fn name(&self) -> &'static str { "no-init" }
///     fn code(&self) -> &'static str { "GA900" }
///
///     fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
///         // inspect pass.tree(), call pass.report(...)
///         Ok(())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Returns the kebab-case name of this rule (e.g., "api-handler").
    fn name(&self) -> &'static str;

    /// Returns the rule code (e.g., "GA001").
    fn code(&self) -> &'static str;

    /// Returns a brief description of what this rule checks.
    fn description(&self) -> &'static str {
        ""
    }

    /// Returns the default severity for diagnostics from this rule.
    fn default_severity(&self) -> Severity {
        Severity::Warning
    }

    /// What this rule inspects.
    fn capabilities(&self) -> Capabilities {
        Capabilities::SYNTAX
    }

    /// Names of rules that must run before this one.
    fn requires(&self) -> &[&'static str] {
        &[]
    }

    /// Inspects one unit.
    ///
    /// # Errors
    ///
    /// An error is reported as a rule fault; other rules keep running.
    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError>;
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// Results published by rules earlier in the schedule, by rule name.
pub(crate) type PassResults = HashMap<&'static str, Box<dyn Any + Send + Sync>>;

/// Access to one unit for one rule.
pub struct Pass<'a> {
    unit: &'a CompilationUnit,
    rule: &'a dyn Rule,
    results: &'a PassResults,
    diagnostics: Vec<Diagnostic>,
    output: Option<Box<dyn Any + Send + Sync>>,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(
        unit: &'a CompilationUnit,
        rule: &'a dyn Rule,
        results: &'a PassResults,
    ) -> Self {
        Self {
            unit,
            rule,
            results,
            diagnostics: Vec::new(),
            output: None,
        }
    }

    pub(crate) fn finish(self) -> (Vec<Diagnostic>, Option<Box<dyn Any + Send + Sync>>) {
        (self.diagnostics, self.output)
    }

    /// The unit under analysis.
    #[must_use]
    pub fn unit(&self) -> &'a CompilationUnit {
        self.unit
    }

    /// Syntax tree of the unit.
    #[must_use]
    pub fn tree(&self) -> &'a SyntaxTree {
        self.unit.tree()
    }

    /// Source file of the unit.
    #[must_use]
    pub fn file(&self) -> &'a SourceFile {
        self.unit.file()
    }

    /// Semantic facts of the unit.
    #[must_use]
    pub fn semantics(&self) -> &'a dyn SemanticBridge {
        self.unit.semantics()
    }

    /// Import path of the unit's package, if known.
    #[must_use]
    pub fn package_path(&self) -> Option<&'a str> {
        self.unit.package_path()
    }

    /// Project module prefix, if known.
    #[must_use]
    pub fn module(&self) -> Option<&'a str> {
        self.unit.module()
    }

    /// Creates a diagnostic of this rule at `span`.
    #[must_use]
    pub fn diagnostic(&self, span: Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(
            self.rule.code(),
            self.rule.name(),
            self.rule.default_severity(),
            Location::from_span(self.file(), span),
            message,
        )
    }

    /// Appends a diagnostic unless an allow comment suppresses it.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        let check = check_allow_with_reason(
            self.file().content(),
            diagnostic.location.line,
            self.rule.name(),
        );
        match check {
            AllowCheck::Denied => self.diagnostics.push(diagnostic),
            AllowCheck::Allowed { reason } => tracing::debug!(
                "{}:{}: {} suppressed ({})",
                diagnostic.location.file.display(),
                diagnostic.location.line,
                self.rule.name(),
                reason.as_deref().unwrap_or("no reason given")
            ),
        }
    }

    /// Publishes this rule's result for dependents.
    pub fn set_result<T: Any + Send + Sync>(&mut self, value: T) {
        self.output = Some(Box::new(value));
    }

    /// Reads the result a prerequisite published for this unit.
    ///
    /// # Errors
    ///
    /// Fails if the prerequisite published nothing or a different type.
    pub fn result_of<T: Any>(&self, name: &str) -> Result<&'a T, RuleError> {
        let results: &'a PassResults = self.results;
        let value = results.get(name).ok_or_else(|| RuleError::MissingResult {
            rule: self.rule.name().to_string(),
            dependency: name.to_string(),
        })?;
        value
            .downcast_ref::<T>()
            .ok_or_else(|| RuleError::ResultType {
                dependency: name.to_string(),
            })
    }
}

/// Rule defined by a closure, for host registration.
pub struct FnRule<F> {
    name: &'static str,
    code: &'static str,
    description: &'static str,
    requires: Vec<&'static str>,
    run: F,
}

impl<F> FnRule<F>
where
    F: Fn(&mut Pass<'_>) -> Result<(), RuleError> + Send + Sync,
{
    /// Creates a closure rule.
    pub fn new(
        name: &'static str,
        code: &'static str,
        description: &'static str,
        requires: &[&'static str],
        run: F,
    ) -> Self {
        Self {
            name,
            code,
            description,
            requires: requires.to_vec(),
            run,
        }
    }
}

impl<F> Rule for FnRule<F>
where
    F: Fn(&mut Pass<'_>) -> Result<(), RuleError> + Send + Sync,
{
    fn name(&self) -> &'static str {
        self.name
    }

    fn code(&self) -> &'static str {
        self.code
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn requires(&self) -> &[&'static str] {
        &self.requires
    }

    fn run(&self, pass: &mut Pass<'_>) -> Result<(), RuleError> {
        (self.run)(pass)
    }
}
