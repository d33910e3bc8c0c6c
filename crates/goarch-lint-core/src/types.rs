//! Core types for diagnostics, suggested fixes and results.

use crate::context::SourceFile;
use crate::fix::FixError;
use crate::tree::Span;
use miette::{Diagnostic as MietteDiagnostic, SourceSpan};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path relative to project root.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed, bytes).
    pub column: usize,
    /// Byte offset in file.
    pub offset: usize,
    /// Length of the span in bytes.
    pub length: usize,
}

impl Location {
    /// Creates a location for a span of a source file.
    #[must_use]
    pub fn from_span(file: &SourceFile, span: Span) -> Self {
        let (line, column) = file.lines().line_col(span.start);
        Self {
            file: file.relative_path().to_path_buf(),
            line,
            column,
            offset: span.start,
            length: span.len(),
        }
    }

    /// Creates a location with explicit values.
    #[must_use]
    pub fn new(file: PathBuf, line: usize, column: usize) -> Self {
        Self {
            file,
            line,
            column,
            offset: 0,
            length: 0,
        }
    }

}

/// One replacement over a half-open byte range of the original source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextEdit {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive); equal to `start` for insertions.
    pub end: usize,
    /// Replacement text.
    pub replacement: String,
}

impl TextEdit {
    /// Replaces the text covered by `span`.
    #[must_use]
    pub fn replace(span: Span, replacement: impl Into<String>) -> Self {
        Self {
            start: span.start,
            end: span.end,
            replacement: replacement.into(),
        }
    }

    /// Inserts text at `offset`.
    #[must_use]
    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self {
            start: offset,
            end: offset,
            replacement: text.into(),
        }
    }

    /// Returns true if the two edits touch the same bytes.
    ///
    /// Insertions at the same offset count as overlapping because their
    /// relative order would be ambiguous.
    #[must_use]
    pub fn overlaps(&self, other: &TextEdit) -> bool {
        if self.start == other.start {
            return true;
        }
        self.start < other.end && other.start < self.end
    }
}

/// A named, ordered set of non-overlapping edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedFix {
    /// Human-readable description.
    pub description: String,
    edits: Vec<TextEdit>,
}

impl SuggestedFix {
    /// Creates a fix, sorting edits by offset.
    ///
    /// # Errors
    ///
    /// Returns an error if an edit has `start > end` or two edits overlap.
    pub fn new(description: impl Into<String>, mut edits: Vec<TextEdit>) -> Result<Self, FixError> {
        if let Some(bad) = edits.iter().find(|e| e.start > e.end) {
            return Err(FixError::InvalidRange {
                start: bad.start,
                end: bad.end,
            });
        }
        edits.sort_by_key(|e| (e.start, e.end));
        for pair in edits.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(FixError::Overlap {
                    first: pair[0].start,
                    second: pair[1].start,
                });
            }
        }
        Ok(Self {
            description: description.into(),
            edits,
        })
    }

    /// Single-edit fix.
    ///
    /// # Errors
    ///
    /// Returns an error if the edit range is inverted.
    pub fn single(description: impl Into<String>, edit: TextEdit) -> Result<Self, FixError> {
        Self::new(description, vec![edit])
    }

    /// Edits in ascending offset order.
    #[must_use]
    pub fn edits(&self) -> &[TextEdit] {
        &self.edits
    }
}

/// Whether a diagnostic is a real finding or a downgraded rule fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// A convention violation.
    Finding,
    /// A rule failed while inspecting the unit.
    RuleFault,
}

/// A positioned finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Rule code (e.g., "GA001").
    pub code: String,
    /// Rule name (e.g., "api-handler").
    pub rule: String,
    /// Severity of this diagnostic.
    pub severity: Severity,
    /// Finding or rule fault.
    pub kind: DiagnosticKind,
    /// Primary location.
    pub location: Location,
    /// Human-readable message.
    pub message: String,
    /// Optional free-form help text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Machine-applicable fixes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fixes: Vec<SuggestedFix>,
}

impl Diagnostic {
    /// Creates a finding.
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        rule: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            rule: rule.into(),
            severity,
            kind: DiagnosticKind::Finding,
            location,
            message: message.into(),
            help: None,
            fixes: Vec::new(),
        }
    }

    /// Creates a rule-fault diagnostic positioned at the start of the file.
    #[must_use]
    pub fn rule_fault(code: &str, rule: &str, file: &Path, detail: &str) -> Self {
        Self {
            kind: DiagnosticKind::RuleFault,
            ..Self::new(
                code,
                rule,
                Severity::Error,
                Location::new(file.to_path_buf(), 1, 1),
                format!("rule execution error in `{rule}`: {detail}"),
            )
        }
    }

    /// Adds help text.
    #[must_use]
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Adds a suggested fix.
    #[must_use]
    pub fn with_fix(mut self, fix: SuggestedFix) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Returns true for findings (not rule faults).
    #[must_use]
    pub fn is_finding(&self) -> bool {
        self.kind == DiagnosticKind::Finding
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}:{}: {} [{}] {}",
            self.location.file.display(),
            self.location.line,
            self.location.column,
            self.severity,
            self.code,
            self.message
        )
    }
}

/// Adapter rendering a [`Diagnostic`] through miette.
#[derive(Debug, thiserror::Error, MietteDiagnostic)]
#[error("{message}")]
pub struct ReportDiagnostic {
    message: String,
    #[help]
    help: Option<String>,
    #[label("{label_message}")]
    span: SourceSpan,
    label_message: String,
}

impl From<&Diagnostic> for ReportDiagnostic {
    fn from(d: &Diagnostic) -> Self {
        let help = match (&d.help, d.fixes.first()) {
            (Some(help), _) => Some(help.clone()),
            (None, Some(fix)) => Some(fix.description.clone()),
            (None, None) => None,
        };
        Self {
            message: format!("[{}] {}", d.code, d.message),
            help,
            span: SourceSpan::from((d.location.offset, d.location.length)),
            label_message: d.rule.clone(),
        }
    }
}

/// Diagnostics of one run.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LintResult {
    /// All diagnostics, grouped by file in path order, discovery order within a file.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of files analyzed.
    pub files_checked: usize,
    /// Number of files skipped because the front-end rejected them.
    #[serde(default)]
    pub files_failed: usize,
    /// Whether the run was cancelled before every file was analyzed.
    #[serde(default)]
    pub cancelled: bool,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if at least one finding (not a rule fault) was produced.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_finding)
    }

    /// Returns true if any rule faulted.
    #[must_use]
    pub fn has_faults(&self) -> bool {
        self.diagnostics.iter().any(|d| !d.is_finding())
    }

    /// Counts diagnostics by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        let count = |severity| {
            self.diagnostics
                .iter()
                .filter(|d| d.severity == severity)
                .count()
        };
        (
            count(Severity::Error),
            count(Severity::Warning),
            count(Severity::Info),
        )
    }
}
