//! Init command implementation.

use anyhow::{bail, Context, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# goarch-lint configuration

# Rule set: "recommended" (all rules), "architecture" (GA003-GA007)
# or "minimal" (GA007, GA010)
preset = "recommended"

[analyzer]
# Root directory to analyze (default: current directory)
# root = "./internal"

# Go module path; read from go.mod when omitted
# module = "github.com/acme/todo"

# Glob patterns to exclude from analysis
exclude = [
    "**/vendor/**",
    "**/testdata/**",
    "**/*_gen.go",
]

# Respect .gitignore files
respect_gitignore = true

# Abort when a file fails to parse instead of skipping it
fail_on_parse_error = false

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden.
# Findings can also be silenced inline:
#   // goarch-lint:allow(interface-location) reason="generated mocks"

[rules.style-limits]
enabled = true
# severity = "warning"
max_statements = 50
max_params = 5
max_results = 3
max_fields = 10
max_methods = 5

# [rules.task-fields]
# enabled = false
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_default(Path::new("goarch-lint.toml"), force)?;

    println!("Created goarch-lint.toml");
    println!("\nNext steps:");
    println!("  1. Edit goarch-lint.toml to configure rules");
    println!("  2. Run: goarch-lint check");

    Ok(())
}

fn write_default(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }
    std::fs::write(config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))
}
