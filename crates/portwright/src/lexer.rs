//! Single-pass left-to-right scanner.
//!
//! Produces a flat token stream with exact byte spans into the original
//! source. Malformed input never fails the lexer: unknown bytes become
//! generic punctuation tokens and unterminated literals extend to end of
//! input, leaving recovery to the parser.

use portwright_core::patch::Span;

use crate::token::{is_keyword, Token, TokenKind};

pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
    line: u32,
    col: u32,
    newline_pending: bool,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str) -> Self {
        Lexer {
            src,
            bytes: src.as_bytes(),
            pos: 0,
            line: 1,
            col: 1,
            newline_pending: false,
        }
    }

    fn run(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let (line, col) = (self.line, self.col);
            let newline_before = self.newline_pending;
            self.newline_pending = false;

            let Some(&b) = self.bytes.get(self.pos) else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                    line,
                    col,
                    newline_before,
                });
                return tokens;
            };

            let kind = match b {
                b'\'' | b'"' => self.lex_string(b),
                b'`' => self.lex_template(),
                b'0'..=b'9' => self.lex_number(),
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b'{' => self.single(TokenKind::LBrace),
                b'}' => self.single(TokenKind::RBrace),
                b'[' => self.single(TokenKind::LBracket),
                b']' => self.single(TokenKind::RBracket),
                b',' => self.single(TokenKind::Comma),
                b';' => self.single(TokenKind::Semicolon),
                b':' => self.single(TokenKind::Colon),
                b'.' => self.lex_dot(),
                _ if is_ident_start(b) => self.lex_identifier(),
                _ if is_operator_byte(b) => self.lex_operator_run(),
                _ => {
                    // Unknown byte (or multi-byte char): consume one char.
                    let ch_len = self.src[self.pos..]
                        .chars()
                        .next()
                        .map(|c| c.len_utf8())
                        .unwrap_or(1);
                    self.advance_n(ch_len);
                    TokenKind::Punct
                }
            };

            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
                line,
                col,
                newline_before,
            });
        }
    }

    // ------------------------------------------------------------------
    // Trivia
    // ------------------------------------------------------------------

    fn skip_trivia(&mut self) {
        loop {
            match self.bytes.get(self.pos) {
                Some(b' ') | Some(b'\t') | Some(b'\r') => self.advance(),
                Some(b'\n') => {
                    self.advance();
                    self.newline_pending = true;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(&b) = self.bytes.get(self.pos) {
                        if b == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some(b'/') if self.peek_at(1) == Some(b'*') => {
                    self.advance_n(2);
                    while self.pos < self.bytes.len() {
                        if self.bytes[self.pos] == b'*' && self.peek_at(1) == Some(b'/') {
                            self.advance_n(2);
                            break;
                        }
                        if self.bytes[self.pos] == b'\n' {
                            self.newline_pending = true;
                        }
                        self.advance();
                    }
                }
                _ => return,
            }
        }
    }

    // ------------------------------------------------------------------
    // Literals and identifiers
    // ------------------------------------------------------------------

    fn lex_string(&mut self, quote: u8) -> TokenKind {
        self.advance();
        while let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\\' {
                self.advance_n(2.min(self.bytes.len() - self.pos));
                continue;
            }
            if b == quote {
                self.advance();
                return TokenKind::String;
            }
            if b == b'\n' {
                // Unterminated string: stop at the line break.
                return TokenKind::String;
            }
            self.advance();
        }
        TokenKind::String
    }

    /// Lex a template literal, including `${...}` interpolations. A
    /// backtick only terminates at interpolation depth zero; imbalance
    /// inside a deeply nested interpolation degrades to an overlong token,
    /// which the parser treats as opaque anyway.
    fn lex_template(&mut self) -> TokenKind {
        self.advance();
        let mut depth = 0usize;
        while let Some(&b) = self.bytes.get(self.pos) {
            match b {
                b'\\' => {
                    self.advance_n(2.min(self.bytes.len() - self.pos));
                    continue;
                }
                b'$' if self.peek_at(1) == Some(b'{') => {
                    depth += 1;
                    self.advance_n(2);
                    continue;
                }
                b'}' if depth > 0 => {
                    depth -= 1;
                }
                b'`' if depth == 0 => {
                    self.advance();
                    return TokenKind::Template;
                }
                _ => {}
            }
            self.advance();
        }
        TokenKind::Template
    }

    fn lex_number(&mut self) -> TokenKind {
        while let Some(&b) = self.bytes.get(self.pos) {
            if b.is_ascii_alphanumeric() || b == b'.' || b == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Number
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if is_ident_continue(b) {
                self.advance();
            } else {
                break;
            }
        }
        if is_keyword(&self.src[start..self.pos]) {
            TokenKind::Keyword
        } else {
            TokenKind::Identifier
        }
    }

    // ------------------------------------------------------------------
    // Punctuation
    // ------------------------------------------------------------------

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn lex_dot(&mut self) -> TokenKind {
        if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
            self.advance_n(3);
            return TokenKind::Punct;
        }
        self.advance();
        TokenKind::Dot
    }

    fn lex_operator_run(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(&b) = self.bytes.get(self.pos) {
            if is_operator_byte(b) {
                self.advance();
            } else {
                break;
            }
        }
        match &self.src[start..self.pos] {
            "=" => TokenKind::Equals,
            "=>" => TokenKind::Arrow,
            _ => TokenKind::Punct,
        }
    }

    // ------------------------------------------------------------------
    // Cursor
    // ------------------------------------------------------------------

    fn peek_at(&self, n: usize) -> Option<u8> {
        self.bytes.get(self.pos + n).copied()
    }

    fn advance(&mut self) {
        if let Some(&b) = self.bytes.get(self.pos) {
            if b == b'\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
            self.pos += 1;
        }
    }

    fn advance_n(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

fn is_operator_byte(b: u8) -> bool {
    matches!(
        b,
        b'+' | b'-' | b'*' | b'/' | b'%' | b'<' | b'>' | b'=' | b'!' | b'&' | b'|' | b'^' | b'~'
            | b'?'
    )
}

// ============================================================================
// Tests
// ============================================================================
