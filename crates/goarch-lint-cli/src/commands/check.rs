//! Check command implementation.

use anyhow::{bail, Context, Result};
use goarch_lint_core::{apply_fixes, plan_fixes, Analyzer, Config, Diagnostic, LintResult};
use goarch_lint_go::GoFrontend;
use goarch_lint_rules::{registry, rules_from_config, Preset};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Command-line options of `check`.
#[derive(Debug)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule names or codes.
    pub rules: Option<String>,
    /// Extra exclude patterns.
    pub exclude: Vec<String>,
    /// Write fixes back to the files.
    pub fix: bool,
}

/// Runs the check command and returns the process exit code.
///
/// The code is 1 when at least one finding was reported; rule faults alone
/// do not fail the run.
pub fn run(path: &Path, options: &CheckOptions, source: &ConfigSource) -> Result<i32> {
    let config = source.load()?;
    let preset = preset_of(&config)?;

    let mut registry = registry(rules_from_config(preset, &config));
    if let Some(filter) = &options.rules {
        let requested = requested_names(filter, registry.rules().map(|r| (r.code(), r.name())));
        for unknown in registry.retain_with_prerequisites(&requested) {
            tracing::warn!("Unknown rule: {}", unknown);
        }
    }

    let frontend = match &config.analyzer.module {
        Some(module) => GoFrontend::new().with_module(module.clone()),
        None => GoFrontend::detect(path),
    };

    let analyzer = Analyzer::builder()
        .root(path)
        .excludes(options.exclude.iter().cloned())
        .registry(registry)
        .frontend(frontend)
        .config(config)
        .build()
        .context("Failed to build analyzer")?;

    tracing::info!(
        "Analyzing {} with {} rules (preset: {})",
        path.display(),
        analyzer.rule_count(),
        preset.name()
    );

    let result = analyzer.analyze().context("Analysis failed")?;

    super::output::print(&result, options.format, analyzer.root())?;

    if options.fix {
        let fixed = write_fixes(analyzer.root(), &result)?;
        tracing::info!("Applied {} fix(es)", fixed);
    }

    Ok(i32::from(result.has_findings()))
}

fn preset_of(config: &Config) -> Result<Preset> {
    match config.preset.as_deref() {
        None => Ok(Preset::default()),
        Some(name) => match Preset::from_name(name) {
            Some(preset) => Ok(preset),
            None => bail!(
                "Unknown preset `{name}` (expected one of: {})",
                Preset::ALL.map(Preset::name).join(", ")
            ),
        },
    }
}

/// Maps each requested entry to a rule name, accepting codes as well.
fn requested_names<'r>(
    filter: &str,
    rules: impl Iterator<Item = (&'r str, &'r str)>,
) -> Vec<String> {
    let known: Vec<(&str, &str)> = rules.collect();
    filter
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            known
                .iter()
                .find(|(code, _)| code.eq_ignore_ascii_case(entry))
                .map_or_else(|| entry.to_string(), |(_, name)| (*name).to_string())
        })
        .collect()
}

/// Applies a non-conflicting subset of fixes to each file.
fn write_fixes(root: &Path, result: &LintResult) -> Result<usize> {
    let mut by_file: BTreeMap<&PathBuf, Vec<&Diagnostic>> = BTreeMap::new();
    for diagnostic in result.diagnostics.iter().filter(|d| !d.fixes.is_empty()) {
        by_file
            .entry(&diagnostic.location.file)
            .or_default()
            .push(diagnostic);
    }

    let mut applied = 0;
    for (file, diagnostics) in by_file {
        let plan = plan_fixes(diagnostics);
        if !plan.skipped.is_empty() {
            tracing::warn!(
                "{}: skipped {} conflicting fix(es); run again to apply them",
                file.display(),
                plan.skipped.len()
            );
        }

        let path = root.join(file);
        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let fixed = apply_fixes(&source, &plan.selected)
            .with_context(|| format!("Failed to fix {}", path.display()))?;
        std::fs::write(&path, fixed)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!("{}: applied {} fix(es)", file.display(), plan.selected.len());
        applied += plan.selected.len();
    }
    Ok(applied)
}
