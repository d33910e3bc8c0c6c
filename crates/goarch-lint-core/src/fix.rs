//! Applying suggested fixes to original source text.
//!
//! Edits are computed against the unmodified file; they are applied from the
//! highest offset down so earlier offsets stay valid.

use crate::tree::Span;
use crate::types::{Diagnostic, SuggestedFix, TextEdit};
use thiserror::Error;

/// Errors raised while building or applying fixes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FixError {
    /// An edit has `start > end`.
    #[error("invalid edit range {start}..{end}")]
    InvalidRange {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
    },
    /// Two edits of the same fix overlap.
    #[error("edits at offsets {first} and {second} overlap")]
    Overlap {
        /// Offset of the first edit.
        first: usize,
        /// Offset of the second edit.
        second: usize,
    },
    /// Two different fixes touch the same bytes.
    #[error("fixes `{first}` and `{second}` have overlapping edits")]
    Conflict {
        /// Description of the first fix.
        first: String,
        /// Description of the second fix.
        second: String,
    },
    /// An edit lies outside the source or splits a UTF-8 character.
    #[error("edit {start}..{end} is out of bounds for a source of {len} bytes")]
    OutOfBounds {
        /// Start offset.
        start: usize,
        /// End offset.
        end: usize,
        /// Source length.
        len: usize,
    },
}

/// Collects edits for one [`SuggestedFix`].
///
/// ```ignore
/// let fix = FixBuilder::new("Rename `Done` to `Completed`")
///     .replace(field.span(), "Completed")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct FixBuilder {
    description: String,
    edits: Vec<TextEdit>,
}

impl FixBuilder {
    /// Starts a fix with a description.
    #[must_use]
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            edits: Vec::new(),
        }
    }

    /// Replaces the text covered by `span`.
    #[must_use]
    pub fn replace(mut self, span: Span, replacement: impl Into<String>) -> Self {
        self.edits.push(TextEdit::replace(span, replacement));
        self
    }

    /// Inserts text at `offset`.
    #[must_use]
    pub fn insert(mut self, offset: usize, text: impl Into<String>) -> Self {
        self.edits.push(TextEdit::insert(offset, text));
        self
    }

    /// Validates and builds the fix.
    ///
    /// # Errors
    ///
    /// Returns an error if edits overlap or a range is inverted.
    pub fn build(self) -> Result<SuggestedFix, FixError> {
        SuggestedFix::new(self.description, self.edits)
    }
}

fn check_bounds(source: &str, edit: &TextEdit) -> Result<(), FixError> {
    let valid = edit.end <= source.len()
        && source.is_char_boundary(edit.start)
        && source.is_char_boundary(edit.end);
    if valid {
        Ok(())
    } else {
        Err(FixError::OutOfBounds {
            start: edit.start,
            end: edit.end,
            len: source.len(),
        })
    }
}

fn apply_edits(source: &str, edits: &mut [&TextEdit]) -> Result<String, FixError> {
    for edit in edits.iter() {
        check_bounds(source, edit)?;
    }
    edits.sort_by_key(|e| std::cmp::Reverse((e.start, e.end)));

    let mut output = source.to_string();
    for edit in edits.iter() {
        output.replace_range(edit.start..edit.end, &edit.replacement);
    }
    Ok(output)
}

/// Applies one fix to the original source.
///
/// # Errors
///
/// Returns an error if an edit is out of bounds.
pub fn apply_fix(source: &str, fix: &SuggestedFix) -> Result<String, FixError> {
    let mut edits: Vec<&TextEdit> = fix.edits().iter().collect();
    apply_edits(source, &mut edits)
}

/// Applies several fixes in one pass over the original source.
///
/// # Errors
///
/// Refuses with [`FixError::Conflict`] when edits of two fixes overlap, and
/// fails if an edit is out of bounds.
pub fn apply_fixes(source: &str, fixes: &[&SuggestedFix]) -> Result<String, FixError> {
    for (i, a) in fixes.iter().enumerate() {
        for b in &fixes[i + 1..] {
            if conflicts(a, b) {
                return Err(FixError::Conflict {
                    first: a.description.clone(),
                    second: b.description.clone(),
                });
            }
        }
    }
    let mut edits: Vec<&TextEdit> = fixes.iter().flat_map(|f| f.edits()).collect();
    apply_edits(source, &mut edits)
}

/// Returns true if any edit of `a` overlaps any edit of `b`.
#[must_use]
pub fn conflicts(a: &SuggestedFix, b: &SuggestedFix) -> bool {
    a.edits()
        .iter()
        .any(|ea| b.edits().iter().any(|eb| ea.overlaps(eb)))
}

/// Outcome of [`plan_fixes`].
#[derive(Debug, Default)]
pub struct FixPlan<'d> {
    /// Fixes selected for application, in stream order.
    pub selected: Vec<&'d SuggestedFix>,
    /// Fixes left out because they conflict with an earlier selection.
    pub skipped: Vec<&'d SuggestedFix>,
}

/// Selects the first fix of each diagnostic, skipping any that conflicts
/// with one already selected.
///
/// All diagnostics must belong to the same file.
#[must_use]
pub fn plan_fixes<'d, I>(diagnostics: I) -> FixPlan<'d>
where
    I: IntoIterator<Item = &'d Diagnostic>,
{
    let mut plan = FixPlan::default();
    for fix in diagnostics.into_iter().filter_map(|d| d.fixes.first()) {
        if plan.selected.iter().any(|s| conflicts(s, fix)) {
            plan.skipped.push(fix);
        } else {
            plan.selected.push(fix);
        }
    }
    plan
}
