//! Token types for the chain-aware lexer.
//!
//! The lexer produces just enough lexical structure to recognize member/call
//! chains, literals, arrow functions, and block boundaries. Anything else
//! (operators, regex literals) lexes as generic punctuation and is handled
//! by the parser's opaque recovery. Comments and whitespace are trivia and
//! never become tokens, which is what guarantees that emitted review
//! comments can never re-match on a second pass.

use portwright_core::patch::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Keyword,
    String,
    Template,
    Number,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Semicolon,
    Arrow,
    Equals,
    Colon,
    /// Any other operator or punctuation (lexed greedily as a run).
    Punct,
    Eof,
}

#[derive(Debug, Clone, Copy)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// 1-indexed line of the token start.
    pub line: u32,
    /// 1-indexed column of the token start.
    pub col: u32,
    /// Whether a line terminator appeared in the trivia before this token.
    pub newline_before: bool,
}

impl Token {
    /// The raw text of the token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.span.start..self.span.end]
    }
}

/// Keywords the parser dispatches on. Everything else lexes as an
/// identifier, which is fine: unrecognized statements degrade to opaque.
pub fn is_keyword(word: &str) -> bool {
    matches!(
        word,
        "const"
            | "let"
            | "var"
            | "function"
            | "async"
            | "await"
            | "return"
            | "import"
            | "export"
            | "if"
            | "else"
            | "for"
            | "while"
            | "do"
            | "switch"
            | "case"
            | "default"
            | "try"
            | "catch"
            | "finally"
            | "throw"
            | "new"
            | "class"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_classification() {
        assert!(is_keyword("const"));
        assert!(is_keyword("await"));
        assert!(!is_keyword("cy"));
        assert!(!is_keyword("describe"));
    }
}
