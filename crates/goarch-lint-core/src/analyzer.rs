//! Core analyzer: file discovery and the per-unit pass runner.

use crate::config::{Config, ConfigError, RuleConfig};
use crate::context::{CompilationUnit, Frontend, FrontendError, SourceFile};
use crate::registry::{GraphError, PassGraph, Registry, Scheduled};
use crate::rule::{Pass, PassResults, Rule, RuleBox};
use crate::types::{Diagnostic, LintResult};

use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during analysis.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// IO error reading files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error walking the source tree.
    #[error("Walk error: {0}")]
    Walk(#[from] ignore::Error),

    /// A file failed to parse and `fail_on_parse_error` is set.
    #[error("Parse error in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// Glob pattern error.
    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] glob::PatternError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid rule set.
    #[error("Invalid rule set: {0}")]
    Graph(#[from] GraphError),

    /// File analysis was requested without a front-end.
    #[error("No front-end configured; cannot load source files")]
    MissingFrontend,

    /// The worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Cooperative cancellation flag shared with a running analysis.
///
/// Checked before each unit starts; a unit already running completes.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Builder for configuring an [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    root: Option<PathBuf>,
    registry: Registry,
    exclude_patterns: Vec<String>,
    config: Option<Config>,
    frontend: Option<Arc<dyn Frontend>>,
    fail_on_parse_error: Option<bool>,
    parallelism: Option<usize>,
    cancellation: CancellationToken,
}

impl AnalyzerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root directory to analyze.
    #[must_use]
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Adds a rule to the analyzer.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.registry.register(rule);
        self
    }

    /// Adds a boxed rule to the analyzer.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.registry.register_box(rule);
        self
    }

    /// Uses a prepared registry, replacing rules added so far.
    #[must_use]
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Adds multiple exclude glob patterns.
    #[must_use]
    pub fn excludes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Sets the configuration.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the front-end used to load files.
    #[must_use]
    pub fn frontend<F: Frontend + 'static>(mut self, frontend: F) -> Self {
        self.frontend = Some(Arc::new(frontend));
        self
    }

    /// Sets whether to fail on parse errors (default: false).
    #[must_use]
    pub fn fail_on_parse_error(mut self, fail: bool) -> Self {
        self.fail_on_parse_error = Some(fail);
        self
    }

    /// Caps the number of worker threads.
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Shares a cancellation token with the analyzer.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Builds the analyzer.
    ///
    /// # Errors
    ///
    /// Returns an error if the rule set is invalid (cycle, unknown or
    /// duplicate rule), an exclude pattern is malformed, or the current
    /// directory cannot be resolved.
    pub fn build(self) -> Result<Analyzer, AnalyzerError> {
        let graph = self.registry.build()?;
        let config = self.config.unwrap_or_default();

        let root = self
            .root
            .unwrap_or_else(|| config.analyzer.root.clone());
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(&root)
        };

        let mut exclude_patterns = self.exclude_patterns;
        exclude_patterns.extend(config.analyzer.exclude.iter().cloned());
        let exclude = exclude_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        let plan = graph.schedule(|name| config.is_rule_enabled(name));
        for rule in graph.rules() {
            if !config.is_rule_enabled(rule.name()) {
                debug!("Skipping disabled rule: {}", rule.name());
            }
        }

        Ok(Analyzer {
            root,
            graph,
            plan,
            exclude,
            fail_on_parse_error: self
                .fail_on_parse_error
                .unwrap_or(config.analyzer.fail_on_parse_error),
            parallelism: self.parallelism.or(config.analyzer.parallelism),
            frontend: self.frontend,
            cancellation: self.cancellation,
            config,
        })
    }
}

/// Outcome of one file.
enum FileOutcome {
    Analyzed(Vec<Diagnostic>),
    Failed { path: PathBuf, message: String },
    Cancelled,
}

/// The main analyzer that orchestrates lint execution.
///
/// Use [`Analyzer::builder()`] to construct an instance.
pub struct Analyzer {
    root: PathBuf,
    graph: PassGraph,
    plan: Vec<Scheduled>,
    exclude: Vec<glob::Pattern>,
    config: Config,
    frontend: Option<Arc<dyn Frontend>>,
    fail_on_parse_error: bool,
    parallelism: Option<usize>,
    cancellation: CancellationToken,
}

impl Analyzer {
    /// Creates a new builder for configuring an analyzer.
    #[must_use]
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::new()
    }

    /// Returns the root directory being analyzed.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the number of registered rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.graph.len()
    }

    /// Returns the validated rule graph.
    #[must_use]
    pub fn graph(&self) -> &PassGraph {
        &self.graph
    }

    /// Gets the rule configuration for a specific rule.
    #[must_use]
    pub fn rule_config(&self, rule_name: &str) -> Option<&RuleConfig> {
        self.config.rule(rule_name)
    }

    /// Token that cancels this analyzer's runs.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Discovers, parses and analyzes all files under the root.
    ///
    /// # Errors
    ///
    /// Returns an error if no front-end is set, discovery fails, a file
    /// cannot be read, or a file fails to parse with `fail_on_parse_error`.
    pub fn analyze(&self) -> Result<LintResult, AnalyzerError> {
        let frontend = self
            .frontend
            .as_deref()
            .ok_or(AnalyzerError::MissingFrontend)?;
        info!("Starting analysis at {:?}", self.root);

        let files = self.discover_files(frontend)?;
        info!("Found {} files to analyze", files.len());

        let outcomes = self.in_pool(|| {
            files
                .par_iter()
                .map(|path| self.analyze_path(frontend, path))
                .collect::<Result<Vec<_>, _>>()
        })??;

        let mut result = LintResult::new();
        for outcome in outcomes {
            match outcome {
                FileOutcome::Analyzed(diagnostics) => {
                    result.diagnostics.extend(diagnostics);
                    result.files_checked += 1;
                }
                FileOutcome::Failed { path, message } => {
                    warn!("Failed to parse {}: {}", path.display(), message);
                    if self.fail_on_parse_error {
                        return Err(AnalyzerError::Parse { path, message });
                    }
                    result.files_failed += 1;
                }
                FileOutcome::Cancelled => result.cancelled = true,
            }
        }

        info!(
            "Analysis complete: {} diagnostics in {} files",
            result.diagnostics.len(),
            result.files_checked
        );
        Ok(result)
    }

    /// Analyzes units that were loaded by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be built.
    pub fn analyze_units(&self, units: &[CompilationUnit]) -> Result<LintResult, AnalyzerError> {
        let streams: Vec<Option<Vec<Diagnostic>>> = self.in_pool(|| {
            units
                .par_iter()
                .map(|unit| (!self.cancellation.is_cancelled()).then(|| self.run_unit(unit)))
                .collect()
        })?;

        let mut result = LintResult::new();
        for stream in streams {
            match stream {
                Some(diagnostics) => {
                    result.diagnostics.extend(diagnostics);
                    result.files_checked += 1;
                }
                None => result.cancelled = true,
            }
        }
        Ok(result)
    }

    /// Runs every scheduled rule over one unit and returns its diagnostic
    /// stream, in schedule order and discovery order within each rule.
    ///
    /// A rule that panics or returns an error contributes one rule-fault
    /// diagnostic instead of its findings; later rules still run.
    #[must_use]
    pub fn run_unit(&self, unit: &CompilationUnit) -> Vec<Diagnostic> {
        debug!("Analyzing: {}", unit.file().relative_path().display());

        let mut results = PassResults::new();
        let mut stream = Vec::new();

        for step in &self.plan {
            let rule = self.graph.rule(step.index);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                let mut pass = Pass::new(unit, rule, &results);
                rule.run(&mut pass).map(|()| pass.finish())
            }));

            let detail = match outcome {
                Ok(Ok((diagnostics, output))) => {
                    if let Some(output) = output {
                        results.insert(rule.name(), output);
                    }
                    if !step.silent {
                        stream.extend(self.apply_severity_override(rule.name(), diagnostics));
                    }
                    continue;
                }
                Ok(Err(error)) => error.to_string(),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            warn!(
                "Rule {} failed on {}: {}",
                rule.name(),
                unit.file().relative_path().display(),
                detail
            );
            stream.push(Diagnostic::rule_fault(
                rule.code(),
                rule.name(),
                unit.file().relative_path(),
                &detail,
            ));
        }

        stream
    }

    /// Applies severity overrides from configuration.
    fn apply_severity_override(
        &self,
        rule_name: &str,
        mut diagnostics: Vec<Diagnostic>,
    ) -> Vec<Diagnostic> {
        if let Some(severity) = self.config.rule_severity(rule_name) {
            for d in diagnostics.iter_mut().filter(|d| d.is_finding()) {
                d.severity = severity;
            }
        }
        diagnostics
    }

    fn analyze_path(
        &self,
        frontend: &dyn Frontend,
        path: &Path,
    ) -> Result<FileOutcome, AnalyzerError> {
        if self.cancellation.is_cancelled() {
            return Ok(FileOutcome::Cancelled);
        }

        let content = std::fs::read_to_string(path)?;
        let file = SourceFile::new(path, content, &self.root);
        match frontend.load(file) {
            Ok(unit) => Ok(FileOutcome::Analyzed(self.run_unit(&unit))),
            Err(FrontendError::Setup(message)) => Err(AnalyzerError::Parse {
                path: path.to_path_buf(),
                message,
            }),
            Err(error) => Ok(FileOutcome::Failed {
                path: path.to_path_buf(),
                message: error.to_string(),
            }),
        }
    }

    fn in_pool<T, F>(&self, work: F) -> Result<T, AnalyzerError>
    where
        T: Send,
        F: FnOnce() -> T + Send,
    {
        match self.parallelism {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()?;
                Ok(pool.install(work))
            }
            None => Ok(work()),
        }
    }

    /// Discovers source files handled by the front-end, in path order.
    fn discover_files(&self, frontend: &dyn Frontend) -> Result<Vec<PathBuf>, AnalyzerError> {
        let mut builder = ignore::WalkBuilder::new(&self.root);
        builder.git_ignore(self.config.analyzer.respect_gitignore);

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() || !has_extension(path, frontend.extensions()) {
                continue;
            }
            if self.should_exclude(path) {
                debug!("Excluding: {}", path.display());
                continue;
            }
            files.push(path.to_path_buf());
        }

        files.sort();
        Ok(files)
    }

    /// Checks if a path matches an exclude pattern, absolute or relative to the root.
    fn should_exclude(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        self.exclude
            .iter()
            .any(|p| p.matches_path(path) || p.matches_path(relative))
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|want| want.trim_start_matches('.') == ext)
        })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
