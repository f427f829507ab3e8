//! Syntax tree for the chain-aware parser.
//!
//! The tree is deliberately partial: it models exactly what the matcher
//! needs (member/call chains, literals, arrow functions, block structure)
//! and wraps everything else in `Opaque` nodes that carry the verbatim
//! source span. Every node owns a span into the original source; sibling
//! spans are monotonically increasing. Passes never mutate nodes; the
//! rewriter produces an edit list instead.

use portwright_core::patch::Span;

#[derive(Debug, Clone)]
pub enum Node {
    Program {
        statements: Vec<Node>,
        span: Span,
    },
    Block {
        statements: Vec<Node>,
        span: Span,
    },
    /// An expression used in statement position.
    ExprStmt {
        expr: Box<Node>,
        span: Span,
    },
    /// `const`/`let`/`var` declaration with a single declarator.
    VarDecl {
        name: String,
        init: Option<Box<Node>>,
        span: Span,
    },
    /// A statement region that could not be parsed. Braced blocks found
    /// while recovering are parsed normally and kept as children so the
    /// remainder of the file still converts.
    Opaque {
        children: Vec<Node>,
        span: Span,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
        span: Span,
    },
    Member {
        object: Box<Node>,
        /// Property name, or the raw bracket contents when `computed`.
        property: String,
        computed: bool,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    /// String literal with its decoded value.
    Str {
        value: String,
        span: Span,
    },
    /// Numeric literal, kept raw.
    Num {
        raw: String,
        span: Span,
    },
    Template {
        span: Span,
    },
    /// Arrow function or function expression.
    Func {
        name: Option<String>,
        params: Vec<String>,
        /// Span of the parameter list, including parentheses (or the bare
        /// identifier for single-parameter arrows).
        params_span: Span,
        is_async: bool,
        /// Block body or expression body.
        body: Box<Node>,
        body_is_block: bool,
        span: Span,
    },
    AwaitExpr {
        expr: Box<Node>,
        span: Span,
    },
    /// A balanced-delimiter expression fragment (object literal, array,
    /// regex, operator expression) carried through verbatim.
    OpaqueExpr {
        span: Span,
    },
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Program { span, .. }
            | Node::Block { span, .. }
            | Node::ExprStmt { span, .. }
            | Node::VarDecl { span, .. }
            | Node::Opaque { span, .. }
            | Node::Call { span, .. }
            | Node::Member { span, .. }
            | Node::Ident { span, .. }
            | Node::Str { span, .. }
            | Node::Num { span, .. }
            | Node::Template { span }
            | Node::Func { span, .. }
            | Node::AwaitExpr { span, .. }
            | Node::OpaqueExpr { span } => *span,
        }
    }

    /// String literal value, if this node is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Str { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Numeric literal raw text, if this node is one.
    pub fn as_num(&self) -> Option<&str> {
        match self {
            Node::Num { raw, .. } => Some(raw),
            _ => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Node::Func { .. })
    }
}

/// Decode a quoted string literal's raw text (including quotes) to its
/// value. Handles the common escapes; unknown escapes keep the escaped
/// character as-is.
pub fn decode_string_literal(raw: &str) -> String {
    let inner = if raw.len() >= 2 {
        &raw[1..raw.len() - 1]
    } else {
        raw
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_plain() {
        assert_eq!(decode_string_literal("'#a'"), "#a");
        assert_eq!(decode_string_literal("\"hi\""), "hi");
    }

    #[test]
    fn decode_escapes() {
        assert_eq!(decode_string_literal(r"'it\'s'"), "it's");
        assert_eq!(decode_string_literal(r"'a\nb'"), "a\nb");
        assert_eq!(decode_string_literal(r"'a\\b'"), r"a\b");
    }

    #[test]
    fn span_accessor() {
        let node = Node::Ident {
            name: "cy".to_string(),
            span: Span::new(0, 2),
        };
        assert_eq!(node.span(), Span::new(0, 2));
    }
}
