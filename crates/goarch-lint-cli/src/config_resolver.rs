//! Configuration file discovery and loading.
//!
//! First match wins:
//!
//! 1. `--config <path>`
//! 2. `goarch-lint.toml`, then `.goarch-lint.toml`, in the project directory
//! 3. `config.toml` in the global directory (`$GOARCH_LINT_CONFIG_DIR`, or
//!    `~/.goarch-lint/`)
//! 4. built-in defaults

use anyhow::{Context, Result};
use goarch_lint_core::Config;
use std::path::{Path, PathBuf};

/// Where the configuration comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in the global directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Resolved file, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Reads and parses the configuration, or returns the defaults.
    ///
    /// # Errors
    ///
    /// Fails when the resolved file cannot be read or is not valid TOML.
    pub fn load(&self) -> Result<Config> {
        let Some(path) = self.path() else {
            return Ok(Config::default());
        };
        if matches!(self, Self::Global(_)) {
            tracing::info!("Using global config: {}", path.display());
        }
        Config::from_file(path).with_context(|| format!("Failed to load config: {}", path.display()))
    }
}

const PROJECT_FILES: [&str; 2] = ["goarch-lint.toml", ".goarch-lint.toml"];

const GLOBAL_FILE: &str = "config.toml";

/// Resolves the configuration source for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_in(project_dir, explicit, global_config_dir().as_deref())
}

fn resolve_in(project_dir: &Path, explicit: Option<&Path>, global_dir: Option<&Path>) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }

    if let Some(found) = PROJECT_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
    {
        tracing::debug!("Found project config: {}", found.display());
        return ConfigSource::Project(found);
    }

    match global_dir.map(|d| d.join(GLOBAL_FILE)) {
        Some(found) if found.is_file() => {
            tracing::debug!("Found global config: {}", found.display());
            ConfigSource::Global(found)
        }
        _ => ConfigSource::Default,
    }
}

/// Global configuration directory.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    match std::env::var_os("GOARCH_LINT_CONFIG_DIR") {
        Some(dir) => Some(PathBuf::from(dir)),
        None => home::home_dir().map(|h| h.join(".goarch-lint")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &str) {
        fs::write(path, content).expect("write");
    }

    #[test]
    fn explicit_path_wins_and_is_not_checked() {
        let project = TempDir::new().expect("tempdir");
        touch(&project.path().join("goarch-lint.toml"), "");

        let explicit = Path::new("/missing/custom.toml");
        assert_eq!(
            resolve_in(project.path(), Some(explicit), None),
            ConfigSource::Explicit(explicit.to_path_buf())
        );
    }

    #[test]
    fn plain_name_preferred_over_dotfile() {
        let project = TempDir::new().expect("tempdir");
        touch(&project.path().join(".goarch-lint.toml"), "");
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join(".goarch-lint.toml"))
        );

        touch(&project.path().join("goarch-lint.toml"), "");
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join("goarch-lint.toml"))
        );
    }

    #[test]
    fn global_used_only_without_project_config() {
        let project = TempDir::new().expect("tempdir");
        let global = TempDir::new().expect("tempdir");

        assert_eq!(
            resolve_in(project.path(), None, Some(global.path())),
            ConfigSource::Default
        );

        touch(&global.path().join("config.toml"), "");
        assert_eq!(
            resolve_in(project.path(), None, Some(global.path())),
            ConfigSource::Global(global.path().join("config.toml"))
        );

        touch(&project.path().join("goarch-lint.toml"), "");
        assert!(matches!(
            resolve_in(project.path(), None, Some(global.path())),
            ConfigSource::Project(_)
        ));
    }

    #[test]
    fn load_parses_or_defaults() {
        assert!(ConfigSource::Default.load().expect("defaults").preset.is_none());

        let project = TempDir::new().expect("tempdir");
        let path = project.path().join("goarch-lint.toml");
        touch(&path, "preset = \"minimal\"\n[rules.style-limits]\nmax_fields = 4\n");
        let config = ConfigSource::Project(path.clone()).load().expect("config");
        assert_eq!(config.preset.as_deref(), Some("minimal"));
        assert_eq!(
            config.rule("style-limits").map(|r| r.get_usize("max_fields", 10)),
            Some(4)
        );

        touch(&path, "preset = [");
        assert!(ConfigSource::Project(path).load().is_err());
    }
}
