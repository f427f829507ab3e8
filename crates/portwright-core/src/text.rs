//! Text position utilities for byte offset and line:column conversions.
//!
//! Lines and columns are 1-indexed (editor convention); byte offsets are
//! 0-indexed. Columns count Unicode scalar values, not bytes.

use crate::patch::Span;

/// Convert a byte offset to 1-indexed line and column.
///
/// If `offset` exceeds the content length, returns the position at the end
/// of the content.
pub fn byte_offset_to_position(content: &str, offset: usize) -> (u32, u32) {
    let mut line = 1u32;
    let mut col = 1u32;
    let mut current = 0usize;

    for ch in content.chars() {
        if current >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
        current += ch.len_utf8();
    }

    (line, col)
}

/// Extract the text content of a span.
///
/// Returns `None` if the span is out of bounds or splits a UTF-8 sequence.
pub fn extract_span<'a>(content: &'a str, span: &Span) -> Option<&'a str> {
    content.get(span.start..span.end)
}

/// Extract a span as a single-line snippet for report output.
///
/// Multi-line spans are joined with a space so report entries stay readable;
/// leading/trailing whitespace is trimmed.
pub fn snippet(content: &str, span: &Span) -> String {
    let raw = extract_span(content, span).unwrap_or("");
    let mut out = String::with_capacity(raw.len());
    for (i, line) in raw.lines().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(line.trim());
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_to_position_simple() {
        let content = "line1\nline2\nline3\n";
        assert_eq!(byte_offset_to_position(content, 0), (1, 1));
        assert_eq!(byte_offset_to_position(content, 4), (1, 5));
        assert_eq!(byte_offset_to_position(content, 6), (2, 1));
        assert_eq!(byte_offset_to_position(content, 12), (3, 1));
    }

    #[test]
    fn offset_beyond_content_clamps_to_end() {
        let (line, col) = byte_offset_to_position("short", 100);
        assert_eq!((line, col), (1, 6));
    }

    #[test]
    fn multibyte_columns_count_chars() {
        let content = "héllo\nx";
        // 'é' is two bytes; the byte offset after it is 3, column 3.
        assert_eq!(byte_offset_to_position(content, 3), (1, 3));
    }

    #[test]
    fn extract_span_valid() {
        let span = Span::new(0, 5);
        assert_eq!(extract_span("hello world", &span), Some("hello"));
    }

    #[test]
    fn extract_span_out_of_bounds() {
        let span = Span::new(0, 100);
        assert_eq!(extract_span("short", &span), None);
    }

    #[test]
    fn snippet_joins_lines() {
        let content = "cy.get('#a')\n  .click();";
        let span = Span::new(0, content.len());
        assert_eq!(snippet(content, &span), "cy.get('#a') .click();");
    }
}
