//! Edit IR: spans and splice edits over a single source document.
//!
//! The rewriter expresses every accepted transformation as an [`Edit`]
//! against the original source text. Edits are applied atomically: the
//! whole set is validated for overlap conflicts first, then spliced in a
//! single right-to-left pass so earlier edits never shift later offsets.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Span
// ============================================================================

/// Byte offsets into source text.
///
/// Spans are half-open intervals: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    ///
    /// # Panics
    /// Panics if `start > end`.
    pub fn new(start: usize, end: usize) -> Self {
        assert!(
            start <= end,
            "Span start ({}) must be <= end ({})",
            start,
            end
        );
        Span { start, end }
    }

    /// Length of the span in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span overlaps with another.
    ///
    /// Adjacent spans (one ends where another starts) do NOT overlap.
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Check if this span contains another span entirely.
    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Join two spans into the smallest span covering both.
    pub fn cover(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

// ============================================================================
// Edit
// ============================================================================

/// A single splice edit: replace the bytes at `span` with `new_text`.
///
/// Edits carry the id of the rule that produced them so the emitted report
/// can attribute every change without re-diffing text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// The byte range in the original source to replace.
    pub span: Span,
    /// Replacement text.
    pub new_text: String,
    /// Id of the rule that produced this edit.
    pub rule_id: String,
}

impl Edit {
    /// Create a new edit.
    pub fn new(span: Span, new_text: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Edit {
            span,
            new_text: new_text.into(),
            rule_id: rule_id.into(),
        }
    }

    /// Create a pure insertion at `offset`.
    pub fn insert(offset: usize, new_text: impl Into<String>, rule_id: impl Into<String>) -> Self {
        Edit::new(Span::new(offset, offset), new_text, rule_id)
    }
}

/// Overlap conflict found while validating an edit set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("conflicting edits: {first_rule} at {first_span} overlaps {second_rule} at {second_span}")]
pub struct EditConflict {
    pub first_rule: String,
    pub first_span: Span,
    pub second_rule: String,
    pub second_span: Span,
}

/// Validate an edit set and apply it to `source`, producing the new text.
///
/// Edits may be supplied in any order. Two edits conflict when their spans
/// overlap; two pure insertions at the same offset do not conflict and are
/// applied in the order given. The whole set is rejected if any conflict
/// exists (all-or-nothing).
pub fn apply_edits(source: &str, edits: &[Edit]) -> Result<String, EditConflict> {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    // Stable sort keeps registration order for insertions at the same offset.
    ordered.sort_by_key(|e| (e.span.start, e.span.end));

    for pair in ordered.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a.span.overlaps(&b.span) {
            return Err(EditConflict {
                first_rule: a.rule_id.clone(),
                first_span: a.span,
                second_rule: b.rule_id.clone(),
                second_span: b.span,
            });
        }
    }

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for edit in &ordered {
        debug_assert!(edit.span.end <= source.len(), "edit span out of bounds");
        out.push_str(&source[cursor..edit.span.start]);
        out.push_str(&edit.new_text);
        cursor = edit.span.end;
    }
    out.push_str(&source[cursor..]);
    Ok(out)
}

// ============================================================================
// Tests
// ============================================================================
