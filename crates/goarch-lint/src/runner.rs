//! One-call entry points over the analyzer, front-end and presets.

use goarch_lint_core::{
    Analyzer, AnalyzerError, CompilationUnit, Config, ConfigError, Diagnostic, Frontend,
    FrontendError, LintResult, SourceFile,
};
use goarch_lint_go::GoFrontend;
use goarch_lint_rules::{registry, rules_from_config, Preset};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file names searched in the project root, in priority order.
const CONFIG_CANDIDATES: &[&str] = &["goarch-lint.toml", ".goarch-lint.toml"];

/// Errors of the convenience entry points.
#[derive(Debug, Error)]
pub enum LintError {
    /// The configuration file is unreadable or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration names a preset that does not exist.
    #[error("unknown preset `{0}` (expected recommended, architecture or minimal)")]
    UnknownPreset(String),

    /// The analyzer could not be built or the run failed.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),

    /// The source could not be loaded.
    #[error(transparent)]
    Frontend(#[from] FrontendError),
}

/// Loads `goarch-lint.toml` (or `.goarch-lint.toml`) from `root`, or the
/// defaults when neither exists.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(root: &Path) -> Result<Config, LintError> {
    match CONFIG_CANDIDATES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
    {
        Some(path) => {
            tracing::debug!("Using config {}", path.display());
            Ok(Config::from_file(&path)?)
        }
        None => Ok(Config::default()),
    }
}

fn preset_of(config: &Config) -> Result<Preset, LintError> {
    match config.preset.as_deref() {
        None => Ok(Preset::default()),
        Some(name) => Preset::from_name(name).ok_or_else(|| LintError::UnknownPreset(name.to_string())),
    }
}

fn analyzer_for(root: PathBuf, config: Config, frontend: GoFrontend) -> Result<Analyzer, LintError> {
    let preset = preset_of(&config)?;
    let analyzer = Analyzer::builder()
        .root(root)
        .registry(registry(rules_from_config(preset, &config)))
        .frontend(frontend)
        .config(config)
        .build()?;
    Ok(analyzer)
}

/// Lints every Go file under `root` with the project's configuration.
///
/// The module path comes from `[analyzer] module` or `root/go.mod`.
///
/// # Errors
///
/// Returns an error for invalid configuration, an unknown preset, or an
/// analysis failure.
pub fn lint_project(root: impl AsRef<Path>) -> Result<LintResult, LintError> {
    let root = root.as_ref();
    let config = load_config(root)?;
    let frontend = match &config.analyzer.module {
        Some(module) => GoFrontend::new().with_module(module.clone()),
        None => GoFrontend::detect(root),
    };
    Ok(analyzer_for(root.to_path_buf(), config, frontend)?.analyze()?)
}

/// Lints one in-memory Go file with the recommended preset.
///
/// `path` is the file's location relative to the module root; it decides
/// the package path and test-file handling. The source is treated as the
/// whole package.
///
/// # Errors
///
/// Returns an error if the source does not parse.
pub fn lint_source(path: &str, source: &str, module: Option<&str>) -> Result<Vec<Diagnostic>, LintError> {
    lint_source_with(path, source, module, Config::default())
}

/// Like [`lint_source`], with an explicit configuration.
///
/// # Errors
///
/// Returns an error if the source does not parse or the configuration names
/// an unknown preset.
pub fn lint_source_with(
    path: &str,
    source: &str,
    module: Option<&str>,
    config: Config,
) -> Result<Vec<Diagnostic>, LintError> {
    let root = Path::new("/");
    let frontend = match module {
        Some(module) => GoFrontend::new().with_module(module),
        None => GoFrontend::new(),
    }
    .isolated();
    let unit: CompilationUnit = frontend.load(SourceFile::new(&root.join(path), source, root))?;
    let analyzer = analyzer_for(root.to_path_buf(), config, frontend)?;
    Ok(analyzer.run_unit(&unit))
}
