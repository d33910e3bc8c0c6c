//! Shared output formatting for lint results.

use anyhow::Result;
use goarch_lint_core::{LintResult, ReportDiagnostic, Severity};
use miette::{NamedSource, Report};
use std::path::Path;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, format: OutputFormat, root: &Path) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(result),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print_compact(result),
        OutputFormat::Pretty => print_pretty(result, root),
    }
    Ok(())
}

fn print_text(result: &LintResult) {
    let (errors, warnings, infos) = result.count_by_severity();

    for diagnostic in &result.diagnostics {
        let severity_indicator = match diagnostic.severity {
            Severity::Error => "\x1b[31merror\x1b[0m",
            Severity::Warning => "\x1b[33mwarning\x1b[0m",
            Severity::Info => "\x1b[34minfo\x1b[0m",
        };

        println!(
            "{} {} at {}:{}:{}",
            diagnostic.code,
            diagnostic.rule,
            diagnostic.location.file.display(),
            diagnostic.location.line,
            diagnostic.location.column,
        );
        println!("  {}: {}", severity_indicator, diagnostic.message);
        if let Some(help) = &diagnostic.help {
            println!("  = help: {help}");
        }
        for fix in &diagnostic.fixes {
            println!("  = fix: {}", fix.description);
        }
        println!();
    }

    print_summary(result, errors, warnings, infos);
}

fn print_summary(result: &LintResult, errors: usize, warnings: usize, infos: usize) {
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    println!(
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)\x1b[0m",
        summary_color, errors, warnings, infos, result.files_checked
    );
    if result.files_failed > 0 {
        println!("\x1b[33m{} file(s) could not be parsed\x1b[0m", result.files_failed);
    }
    if result.cancelled {
        println!("\x1b[33mAnalysis was cancelled before all files were checked\x1b[0m");
    }
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

fn print_compact(result: &LintResult) {
    for diagnostic in &result.diagnostics {
        println!("{diagnostic}");
    }
}

fn print_pretty(result: &LintResult, root: &Path) {
    for diagnostic in &result.diagnostics {
        let file = &diagnostic.location.file;
        let report = Report::new(ReportDiagnostic::from(diagnostic));
        let report = match std::fs::read_to_string(root.join(file)) {
            Ok(content) => report.with_source_code(NamedSource::new(file.display().to_string(), content)),
            Err(_) => report,
        };
        println!("{report:?}");
    }

    let (errors, warnings, infos) = result.count_by_severity();
    print_summary(result, errors, warnings, infos);
}
