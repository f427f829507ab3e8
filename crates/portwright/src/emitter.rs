//! Final text assembly.
//!
//! Applies the planned edit set to the original source (formatting outside
//! edited spans is preserved byte-for-byte), inserts the Playwright import
//! header at most once, wraps bare top-level conversions in a test block
//! when needed, and assembles the caller-facing report.

use portwright_core::error::ConvertError;
use portwright_core::patch::apply_edits;
use portwright_core::report::ConversionReport;
use tracing::debug;

use crate::rewriter::Plan;

const IMPORT_HEADER: &str = "import { test, expect } from '@playwright/test';\n\n";

pub fn emit(source: &str, plan: Plan) -> Result<ConversionReport, ConvertError> {
    debug!(edits = plan.edits.len(), "emitting");
    let mut output = apply_edits(source, &plan.edits)
        .map_err(|conflict| ConvertError::internal(conflict.to_string()))?;

    if plan.needs_wrapper {
        output = wrap_in_test(&output);
    }
    if plan.needs_import && !has_playwright_import(&output) {
        output.insert_str(0, IMPORT_HEADER);
    }

    Ok(ConversionReport {
        output,
        applied: plan.applied,
        unresolved: plan.unresolved,
        diagnostics: plan.diagnostics,
    })
}

fn has_playwright_import(text: &str) -> bool {
    text.lines()
        .any(|line| line.trim_start().starts_with("import") && line.contains("@playwright/test"))
}

/// Wrap converted statements in a test block so top-level awaits are
/// legal. Leading import lines stay above the wrapper.
fn wrap_in_test(body: &str) -> String {
    let mut split = 0usize;
    for line in body.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with("import ") {
            split += line.len();
        } else {
            break;
        }
    }
    let (head, tail) = body.split_at(split);

    let mut out = String::with_capacity(body.len() + 64);
    out.push_str(head);
    out.push_str("test('converted scenario', async ({ page }) => {\n");
    for line in tail.lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out.push_str("});\n");
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use portwright_core::patch::{Edit, Span};

    fn plan_with(edits: Vec<Edit>, needs_import: bool, needs_wrapper: bool) -> Plan {
        Plan {
            edits,
            needs_import,
            needs_wrapper,
            ..Plan::default()
        }
    }

    #[test]
    fn import_inserted_once_at_top() {
        let src = "await page.goto('/');\n";
        let report = emit(src, plan_with(vec![], true, false)).unwrap();
        assert!(report
            .output
            .starts_with("import { test, expect } from '@playwright/test';\n\n"));
        assert_eq!(report.output.matches("@playwright/test").count(), 1);
    }

    #[test]
    fn existing_import_not_duplicated() {
        let src = "import { test, expect } from '@playwright/test';\n\ntest('x', () => {});\n";
        let report = emit(src, plan_with(vec![], true, false)).unwrap();
        assert_eq!(report.output, src);
    }

    #[test]
    fn wrapper_keeps_imports_above() {
        let src = "import data from './data';\n\nawait page.goto('/');\n";
        let report = emit(src, plan_with(vec![], false, true)).unwrap();
        let out = &report.output;
        let import_pos = out.find("import data").unwrap();
        let wrapper_pos = out.find("test('converted scenario'").unwrap();
        assert!(import_pos < wrapper_pos);
        assert!(out.contains("  await page.goto('/');\n"));
        assert!(out.trim_end().ends_with("});"));
    }

    #[test]
    fn conflicting_edits_surface_as_internal_error() {
        let edits = vec![
            Edit::new(Span::new(0, 5), "x", "r1"),
            Edit::new(Span::new(3, 8), "y", "r2"),
        ];
        let err = emit("hello world", plan_with(edits, false, false)).unwrap_err();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn untouched_text_is_byte_identical() {
        let src = "const x = 1;   // spacing preserved\t\n\n\nconst y = 2;\n";
        let report = emit(src, plan_with(vec![], false, false)).unwrap();
        assert_eq!(report.output, src);
    }
}
