//! Report types returned to callers.
//!
//! A [`ConversionReport`] is created once per `convert()` invocation and
//! handed back immutable. It always contains valid target-language text
//! (possibly with embedded review markers) plus a structured, ordered
//! explanation of every change and every open issue, never a raw
//! exception. These types are the caller contract; field order and array
//! ordering are deterministic.

use serde::{Deserialize, Serialize};

// ============================================================================
// Confidence
// ============================================================================

/// How reliable a rule application is.
///
/// `Heuristic` marks conversions based on naming-convention guesswork (the
/// alias-to-route-glob mapping, route handler carryover) so callers can
/// surface them distinctly from exact structural conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Exact structural correspondence.
    Exact,
    /// Best-effort guess; review recommended.
    Heuristic,
}

// ============================================================================
// Report entries
// ============================================================================

/// One accepted rule application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedChange {
    /// Id of the rule that fired.
    pub rule_id: String,
    /// The original source snippet that was replaced.
    pub original: String,
    /// The replacement snippet.
    pub replacement: String,
    /// How reliable the conversion is.
    pub confidence: Confidence,
    /// 1-indexed line of the original snippet.
    pub line: u32,
    /// Advisory note (e.g. "prefer auto-wait over fixed timeouts").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A construct the converter could not handle, flagged for manual review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnresolvedItem {
    /// The source snippet in question.
    pub snippet: String,
    /// Why it was not converted.
    pub reason: String,
    /// 1-indexed line of the snippet.
    pub line: u32,
}

/// Kinds of recovered (non-fatal) conditions logged during conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A region could not be parsed and was carried through untouched.
    ParseRegionOpaque,
    /// A `cy.*` call shape with no matching rule.
    UnknownCommand,
    /// Two same-precedence rules matched an identical shape; resolved by
    /// registration order but logged so rule-table regressions are visible.
    AmbiguousMatch,
}

/// A recovered condition worth surfacing to test suites and curious callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// 1-indexed line the diagnostic refers to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl Diagnostic {
    /// Create a diagnostic without a line reference.
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line: None,
        }
    }

    /// Create a diagnostic anchored to a line.
    pub fn at_line(kind: DiagnosticKind, message: impl Into<String>, line: u32) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            line: Some(line),
        }
    }
}

// ============================================================================
// ConversionReport
// ============================================================================

/// The complete result of one `convert()` invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The converted source text.
    pub output: String,
    /// Every accepted rule application, in source order.
    pub applied: Vec<AppliedChange>,
    /// Every construct flagged for manual review, in source order.
    pub unresolved: Vec<UnresolvedItem>,
    /// Recovered conditions logged during conversion.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionReport {
    /// A report for input that needed no conversion at all.
    pub fn unchanged(source: impl Into<String>) -> Self {
        ConversionReport {
            output: source.into(),
            applied: Vec::new(),
            unresolved: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Render the change log as human-readable markdown, one bullet per
    /// change, mirroring the shape UIs present to users.
    pub fn explanation(&self) -> String {
        if self.applied.is_empty() && self.unresolved.is_empty() {
            return "No conversions needed.".to_string();
        }
        let mut out = String::from("Conversion changes:\n");
        for change in &self.applied {
            out.push_str(&format!(
                "- [{}] `{}` -> `{}`",
                change.rule_id, change.original, change.replacement
            ));
            if change.confidence == Confidence::Heuristic {
                out.push_str(" (heuristic)");
            }
            if let Some(note) = &change.note {
                out.push_str(&format!(" (note: {})", note));
            }
            out.push('\n');
        }
        if !self.unresolved.is_empty() {
            out.push_str("Needs manual review:\n");
            for item in &self.unresolved {
                out.push_str(&format!("- line {}: `{}` ({})\n", item.line, item.snippet, item.reason));
            }
        }
        out
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod serialization {
        use super::*;

        #[test]
        fn confidence_serializes_lowercase() {
            assert_eq!(
                serde_json::to_string(&Confidence::Heuristic).unwrap(),
                "\"heuristic\""
            );
        }

        #[test]
        fn applied_change_omits_absent_note() {
            let change = AppliedChange {
                rule_id: "nav.visit".to_string(),
                original: "cy.visit('/login')".to_string(),
                replacement: "await page.goto('/login')".to_string(),
                confidence: Confidence::Exact,
                line: 3,
                note: None,
            };
            let json = serde_json::to_string(&change).unwrap();
            assert!(!json.contains("note"));
            assert!(json.contains("\"rule_id\":\"nav.visit\""));
        }

        #[test]
        fn report_omits_empty_diagnostics() {
            let report = ConversionReport::unchanged("const x = 1;");
            let json = serde_json::to_string(&report).unwrap();
            assert!(!json.contains("diagnostics"));
        }

        #[test]
        fn diagnostic_kind_snake_case() {
            let diag = Diagnostic::new(DiagnosticKind::ParseRegionOpaque, "x");
            let json = serde_json::to_string(&diag).unwrap();
            assert!(json.contains("\"parse_region_opaque\""));
        }
    }

    mod explanation {
        use super::*;

        #[test]
        fn unchanged_report_explanation() {
            let report = ConversionReport::unchanged("const x = 1;");
            assert_eq!(report.explanation(), "No conversions needed.");
        }

        #[test]
        fn explanation_lists_changes_and_unresolved() {
            let report = ConversionReport {
                output: String::new(),
                applied: vec![AppliedChange {
                    rule_id: "element.chain".to_string(),
                    original: "cy.get('#a')".to_string(),
                    replacement: "page.locator('#a')".to_string(),
                    confidence: Confidence::Exact,
                    line: 1,
                    note: None,
                }],
                unresolved: vec![UnresolvedItem {
                    snippet: "cy.customThing('x')".to_string(),
                    reason: "unrecognized Cypress command".to_string(),
                    line: 2,
                }],
                diagnostics: Vec::new(),
            };
            let text = report.explanation();
            assert!(text.contains("[element.chain]"));
            assert!(text.contains("Needs manual review:"));
            assert!(text.contains("cy.customThing('x')"));
        }
    }
}
