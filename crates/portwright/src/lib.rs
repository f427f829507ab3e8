//! Cypress to Playwright test-script conversion.
//!
//! The pipeline is parse, match, rewrite, emit: a chain-aware parser
//! produces a partial syntax tree with opaque passthrough for anything it
//! cannot analyze; a precedence-ordered rule registry selects one rewrite
//! per recognized chain; the rewriter expresses accepted rewrites as
//! non-overlapping edits over the original text; and the emitter splices
//! them, adds the Playwright import once, and reports every change.
//!
//! Malformed input never fails a conversion. The only fatal error is an
//! invalid conversion mode, which is a caller bug.
//!
//! ```
//! use portwright::{convert, ConvertOptions};
//!
//! let report = convert("cy.visit('/login');", &ConvertOptions::default()).unwrap();
//! assert!(report.output.contains("await page.goto('/login');"));
//! ```

pub mod ast;
pub mod emitter;
pub mod lexer;
pub mod matcher;
pub mod parser;
pub mod printer;
pub mod rewriter;
pub mod rules;
pub mod token;

use std::str::FromStr;

use tracing::debug_span;

pub use portwright_core::error::ConvertError;
pub use portwright_core::report::{
    AppliedChange, Confidence, ConversionReport, Diagnostic, DiagnosticKind, UnresolvedItem,
};
pub use rules::RuleCategory;

/// What to convert: everything, or a single rule category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMode {
    #[default]
    Full,
    Category(RuleCategory),
}

impl FromStr for ConversionMode {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "full" | "full-conversion" => Ok(ConversionMode::Full),
            other => RuleCategory::from_mode_name(other)
                .map(ConversionMode::Category)
                .ok_or_else(|| ConvertError::invalid_mode(s)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub mode: ConversionMode,
}

/// Convert Cypress source text to Playwright.
///
/// Always returns a complete report for well-formed options: unparseable
/// regions pass through untouched and unconvertible commands are flagged,
/// never dropped.
pub fn convert(source: &str, options: &ConvertOptions) -> Result<ConversionReport, ConvertError> {
    let _span = debug_span!("convert", mode = ?options.mode).entered();
    let filter = match options.mode {
        ConversionMode::Full => None,
        ConversionMode::Category(category) => Some(category),
    };
    let program = parser::parse(source);
    let plan = rewriter::plan(source, &program, filter);
    emitter::emit(source, plan)
}

// ============================================================================
// Tests
// ============================================================================
