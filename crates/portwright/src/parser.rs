//! Chain-aware recursive-descent parser.
//!
//! `parse()` never fails: regions it cannot understand become `Opaque`
//! nodes carrying the raw span. The parser's one hard obligation is chain
//! fidelity: `cy.get(x).should(y).click()` must come back as a
//! call/member chain in exact call order, because call order is
//! semantically load-bearing for the conversion.
//!
//! Braced blocks found inside unparseable control-flow statements are
//! still parsed as statement lists, so a `cy.*` chain inside an `if` body
//! converts even though the `if` header itself stays opaque.

use portwright_core::patch::Span;

use crate::ast::{decode_string_literal, Node};
use crate::lexer::tokenize;
use crate::token::{Token, TokenKind};

/// Parse source text into a `Program` node. Never fails.
pub fn parse(source: &str) -> Node {
    let tokens = tokenize(source);
    let mut parser = Parser {
        src: source,
        tokens,
        pos: 0,
    };
    let statements = parser.parse_statements(false);
    Node::Program {
        statements,
        span: Span::new(0, source.len()),
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    fn cur(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> TokenKind {
        self.cur().kind
    }

    fn text(&self) -> &'a str {
        self.cur().text(self.src)
    }

    fn bump(&mut self) -> Token {
        let tok = *self.cur();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_keyword(&self, word: &str) -> bool {
        self.kind() == TokenKind::Keyword && self.text() == word
    }

    fn prev_end(&self) -> usize {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statements(&mut self, stop_at_rbrace: bool) -> Vec<Node> {
        let mut statements = Vec::new();
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::RBrace if stop_at_rbrace => break,
                TokenKind::RBrace => {
                    // Stray close brace at top level: consume as opaque.
                    let tok = self.bump();
                    statements.push(Node::Opaque {
                        children: Vec::new(),
                        span: tok.span,
                    });
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                _ => statements.push(self.parse_statement()),
            }
        }
        statements
    }

    fn parse_statement(&mut self) -> Node {
        let start = self.cur().span.start;
        match self.kind() {
            TokenKind::Keyword => match self.text() {
                "const" | "let" | "var" => self.parse_var_decl(),
                "function" => self.parse_function_statement(start, false),
                "async" if self.peek(1).kind == TokenKind::Keyword
                    && self.peek(1).text(self.src) == "function" =>
                {
                    self.bump();
                    self.parse_function_statement(start, true)
                }
                "await" | "async" | "new" => self.parse_expression_statement(),
                "return" | "throw" => {
                    self.bump();
                    if matches!(
                        self.kind(),
                        TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
                    ) || self.cur().newline_before
                    {
                        if self.kind() == TokenKind::Semicolon {
                            self.bump();
                        }
                        return Node::Opaque {
                            children: Vec::new(),
                            span: Span::new(start, self.prev_end()),
                        };
                    }
                    let mark = self.pos;
                    match self.parse_expression() {
                        Some(expr) if self.at_statement_boundary() => {
                            if self.kind() == TokenKind::Semicolon {
                                self.bump();
                            }
                            Node::ExprStmt {
                                expr: Box::new(expr),
                                span: Span::new(start, self.prev_end()),
                            }
                        }
                        _ => {
                            self.pos = mark;
                            self.opaque_simple(start)
                        }
                    }
                }
                "import" | "export" => self.opaque_simple(start),
                "if" | "for" | "while" | "do" | "switch" | "try" | "class" => {
                    self.opaque_structured(start)
                }
                _ => self.opaque_simple(start),
            },
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> Node {
        let start = self.cur().span.start;
        let mark = self.pos;
        match self.parse_expression() {
            Some(expr) if self.at_statement_boundary() => {
                if self.kind() == TokenKind::Semicolon {
                    self.bump();
                }
                Node::ExprStmt {
                    expr: Box::new(expr),
                    span: Span::new(start, self.prev_end()),
                }
            }
            _ => {
                self.pos = mark;
                self.opaque_simple(start)
            }
        }
    }

    /// After an expression in statement position, the next token must be a
    /// plausible statement end; otherwise the whole statement is treated as
    /// opaque (e.g. `a + b` parses `a` and then stops here).
    fn at_statement_boundary(&self) -> bool {
        matches!(
            self.kind(),
            TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof
        ) || self.cur().newline_before
    }

    fn parse_var_decl(&mut self) -> Node {
        let start = self.cur().span.start;
        let mark = self.pos;
        self.bump(); // const/let/var
        if self.kind() != TokenKind::Identifier {
            self.pos = mark;
            return self.opaque_simple(start);
        }
        let name = self.text().to_string();
        self.bump();

        let mut init = None;
        if self.kind() == TokenKind::Equals {
            self.bump();
            match self.parse_expression() {
                Some(expr) => init = Some(Box::new(expr)),
                None => {
                    self.pos = mark;
                    return self.opaque_simple(start);
                }
            }
        }

        // Additional declarators or trailing clutter: consume to the
        // statement end without discarding the parsed initializer.
        if self.kind() == TokenKind::Comma {
            self.consume_to_statement_end();
        } else if !self.at_statement_boundary() {
            self.pos = mark;
            return self.opaque_simple(start);
        }
        if self.kind() == TokenKind::Semicolon {
            self.bump();
        }
        Node::VarDecl {
            name,
            init,
            span: Span::new(start, self.prev_end()),
        }
    }

    fn parse_function_statement(&mut self, start: usize, is_async: bool) -> Node {
        let mark = self.pos;
        match self.parse_function_tail(start, is_async) {
            Some(func) => {
                let span = func.span();
                Node::ExprStmt {
                    expr: Box::new(func),
                    span,
                }
            }
            None => {
                self.pos = mark;
                self.opaque_structured(start)
            }
        }
    }

    // ------------------------------------------------------------------
    // Opaque recovery
    // ------------------------------------------------------------------

    /// Consume one unparseable statement, balancing all bracket kinds but
    /// not descending into blocks.
    fn opaque_simple(&mut self, start: usize) -> Node {
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => break,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Semicolon if depth == 0 => {
                    self.bump();
                    break;
                }
                _ => {
                    // A fresh identifier/keyword on a new line at depth zero
                    // starts the next statement.
                    if depth == 0
                        && self.cur().newline_before
                        && self.cur().span.start > start
                        && matches!(
                            self.kind(),
                            TokenKind::Identifier
                                | TokenKind::Keyword
                                | TokenKind::String
                                | TokenKind::Number
                                | TokenKind::Template
                        )
                    {
                        break;
                    }
                    self.bump();
                }
            }
        }
        Node::Opaque {
            children: Vec::new(),
            span: Span::new(start, self.prev_end().max(start)),
        }
    }

    /// Recover a control-flow statement (`if`, `for`, `try`, ...) by
    /// consuming its header opaquely but parsing every braced block it
    /// carries, so chains inside the block bodies still convert.
    fn opaque_structured(&mut self, start: usize) -> Node {
        let mut children = Vec::new();
        loop {
            // Header tokens until a block, terminator, or boundary.
            let mut advanced = false;
            loop {
                match self.kind() {
                    TokenKind::Eof => {
                        return Node::Opaque {
                            children,
                            span: Span::new(start, self.prev_end().max(start)),
                        };
                    }
                    TokenKind::LParen | TokenKind::LBracket => {
                        self.consume_balanced();
                        advanced = true;
                    }
                    TokenKind::Semicolon => {
                        self.bump();
                        return Node::Opaque {
                            children,
                            span: Span::new(start, self.prev_end()),
                        };
                    }
                    TokenKind::RBrace => {
                        return Node::Opaque {
                            children,
                            span: Span::new(start, self.prev_end().max(start)),
                        };
                    }
                    TokenKind::LBrace => break,
                    _ => {
                        self.bump();
                        advanced = true;
                    }
                }
            }
            let _ = advanced;

            // Parse the block body as real statements.
            children.push(self.parse_block());

            // Continuation keywords chain onto the same statement.
            let continues = self.kind() == TokenKind::Keyword
                && matches!(self.text(), "else" | "catch" | "finally" | "while");
            if !continues {
                if self.kind() == TokenKind::Semicolon {
                    self.bump();
                }
                return Node::Opaque {
                    children,
                    span: Span::new(start, self.prev_end()),
                };
            }
        }
    }

    /// Consume a balanced bracketed region starting at the current open
    /// token. Used for headers and computed members.
    fn consume_balanced(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    self.bump();
                    if depth <= 0 {
                        return;
                    }
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn consume_to_statement_end(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Semicolon if depth == 0 => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> Option<Node> {
        let start = self.cur().span.start;

        if self.at_keyword("await") {
            self.bump();
            let expr = self.parse_expression()?;
            let span = Span::new(start, expr.span().end);
            return Some(Node::AwaitExpr {
                expr: Box::new(expr),
                span,
            });
        }

        if self.at_keyword("async") {
            let next = self.peek(1);
            let next_text = next.text(self.src);
            if next.kind == TokenKind::LParen
                || (next.kind == TokenKind::Identifier
                    && self.peek(2).kind == TokenKind::Arrow)
            {
                self.bump();
                return self.parse_arrow(start, true);
            }
            if next.kind == TokenKind::Keyword && next_text == "function" {
                self.bump();
                return self.parse_function_tail(start, true);
            }
            return None;
        }

        if self.at_keyword("function") {
            return self.parse_function_tail(start, false);
        }

        if self.at_keyword("new") {
            // `new Foo(...)`: parse the construction but carry it opaquely.
            self.bump();
            let inner = self.parse_expression()?;
            let span = Span::new(start, inner.span().end);
            return Some(Node::OpaqueExpr { span });
        }

        let primary = self.parse_primary()?;
        Some(self.parse_postfix(primary))
    }

    fn parse_primary(&mut self) -> Option<Node> {
        let start = self.cur().span.start;
        match self.kind() {
            TokenKind::Identifier => {
                if self.peek(1).kind == TokenKind::Arrow {
                    return self.parse_arrow(start, false);
                }
                let tok = self.bump();
                Some(Node::Ident {
                    name: tok.text(self.src).to_string(),
                    span: tok.span,
                })
            }
            TokenKind::String => {
                let tok = self.bump();
                Some(Node::Str {
                    value: decode_string_literal(tok.text(self.src)),
                    span: tok.span,
                })
            }
            TokenKind::Number => {
                let tok = self.bump();
                Some(Node::Num {
                    raw: tok.text(self.src).to_string(),
                    span: tok.span,
                })
            }
            TokenKind::Template => {
                let tok = self.bump();
                Some(Node::Template { span: tok.span })
            }
            TokenKind::LParen => {
                if self.arrow_follows_paren_group() {
                    return self.parse_arrow(start, false);
                }
                self.bump();
                let inner = self.parse_expression()?;
                if self.kind() != TokenKind::RParen {
                    return None;
                }
                self.bump();
                Some(inner)
            }
            TokenKind::LBrace | TokenKind::LBracket => {
                self.consume_balanced();
                Some(Node::OpaqueExpr {
                    span: Span::new(start, self.prev_end()),
                })
            }
            _ => None,
        }
    }

    fn parse_postfix(&mut self, mut expr: Node) -> Node {
        loop {
            match self.kind() {
                TokenKind::Dot => {
                    let next = self.peek(1);
                    if !matches!(next.kind, TokenKind::Identifier | TokenKind::Keyword) {
                        return expr;
                    }
                    self.bump();
                    let prop = self.bump();
                    let span = Span::new(expr.span().start, prop.span.end);
                    expr = Node::Member {
                        object: Box::new(expr),
                        property: prop.text(self.src).to_string(),
                        computed: false,
                        span,
                    };
                }
                TokenKind::LParen => {
                    let args = self.parse_args();
                    let span = Span::new(expr.span().start, self.prev_end());
                    expr = Node::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    let open = self.cur().span.start;
                    self.consume_balanced();
                    let end = self.prev_end();
                    let inner = &self.src[open + 1..end.saturating_sub(1).max(open + 1)];
                    let span = Span::new(expr.span().start, end);
                    expr = Node::Member {
                        object: Box::new(expr),
                        property: inner.to_string(),
                        computed: true,
                        span,
                    };
                }
                _ => return expr,
            }
        }
    }

    /// Parse a call's argument list; the opening paren is current.
    /// Arguments that fail to parse (or stop mid-way) degrade to opaque
    /// fragments bounded by commas at depth zero.
    fn parse_args(&mut self) -> Vec<Node> {
        self.bump(); // (
        let mut args = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RParen => {
                    self.bump();
                    return args;
                }
                TokenKind::Eof => return args,
                TokenKind::Comma => {
                    self.bump();
                }
                _ => {
                    let arg_start = self.cur().span.start;
                    let mark = self.pos;
                    let parsed = self.parse_expression();
                    let at_boundary =
                        matches!(self.kind(), TokenKind::Comma | TokenKind::RParen);
                    match parsed {
                        Some(arg) if at_boundary => args.push(arg),
                        _ => {
                            self.pos = mark;
                            self.consume_opaque_argument();
                            args.push(Node::OpaqueExpr {
                                span: Span::new(arg_start, self.prev_end()),
                            });
                        }
                    }
                }
            }
        }
    }

    fn consume_opaque_argument(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen if depth == 0 => return,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    self.bump();
                }
                TokenKind::Comma if depth == 0 => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Functions
    // ------------------------------------------------------------------

    /// Whether the balanced paren group at the cursor is followed by `=>`.
    fn arrow_follows_paren_group(&self) -> bool {
        let mut i = self.pos;
        let mut depth = 0i32;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .map(|t| t.kind == TokenKind::Arrow)
                            .unwrap_or(false);
                    }
                }
                TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
        false
    }

    /// Parse an arrow function. `start` is where the function expression
    /// begins (the `async` keyword when present); the cursor is at the
    /// parameter list.
    fn parse_arrow(&mut self, start: usize, is_async: bool) -> Option<Node> {
        let (params, params_span) = if self.kind() == TokenKind::Identifier {
            let tok = self.bump();
            (vec![tok.text(self.src).to_string()], tok.span)
        } else {
            self.parse_param_list()?
        };

        if self.kind() != TokenKind::Arrow {
            return None;
        }
        self.bump();

        let (body, body_is_block) = if self.kind() == TokenKind::LBrace {
            (self.parse_block(), true)
        } else {
            let body_start = self.cur().span.start;
            match self.parse_expression() {
                Some(expr) => (expr, false),
                None => {
                    self.consume_opaque_argument();
                    (
                        Node::OpaqueExpr {
                            span: Span::new(body_start, self.prev_end()),
                        },
                        false,
                    )
                }
            }
        };

        let span = Span::new(start, body.span().end);
        Some(Node::Func {
            name: None,
            params,
            params_span,
            is_async,
            body: Box::new(body),
            body_is_block,
            span,
        })
    }

    /// Parse `function name?(params) { ... }` with the cursor at the
    /// `function` keyword.
    fn parse_function_tail(&mut self, start: usize, is_async: bool) -> Option<Node> {
        self.bump(); // function
        let name = if self.kind() == TokenKind::Identifier {
            let tok = self.bump();
            Some(tok.text(self.src).to_string())
        } else {
            None
        };
        let (params, params_span) = self.parse_param_list()?;
        if self.kind() != TokenKind::LBrace {
            return None;
        }
        let body = self.parse_block();
        let span = Span::new(start, body.span().end);
        Some(Node::Func {
            name,
            params,
            params_span,
            is_async,
            body: Box::new(body),
            body_is_block: true,
            span,
        })
    }

    /// Parse a parenthesized parameter list into names. Destructuring
    /// patterns and defaults are consumed but recorded as `{}` / the bare
    /// name; the converter only needs to know whether the list is empty.
    fn parse_param_list(&mut self) -> Option<(Vec<String>, Span)> {
        if self.kind() != TokenKind::LParen {
            return None;
        }
        let start = self.cur().span.start;
        self.bump();
        let mut params = Vec::new();
        loop {
            match self.kind() {
                TokenKind::RParen => {
                    self.bump();
                    return Some((params, Span::new(start, self.prev_end())));
                }
                TokenKind::Eof => return None,
                TokenKind::Comma => {
                    self.bump();
                }
                TokenKind::Identifier => {
                    params.push(self.text().to_string());
                    self.bump();
                    // Default value: consume to the next boundary.
                    if self.kind() == TokenKind::Equals {
                        self.bump();
                        self.consume_param_default();
                    }
                }
                TokenKind::LBrace | TokenKind::LBracket => {
                    self.consume_balanced();
                    params.push("{}".to_string());
                }
                _ => {
                    // Rest params and anything else: consume one token.
                    self.bump();
                }
            }
        }
    }

    fn consume_param_default(&mut self) {
        let mut depth = 0i32;
        loop {
            match self.kind() {
                TokenKind::Eof => return,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                    depth += 1;
                    self.bump();
                }
                TokenKind::RParen if depth == 0 => return,
                TokenKind::Comma if depth == 0 => return,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    depth -= 1;
                    self.bump();
                }
                _ => {
                    self.bump();
                }
            }
        }
    }

    fn parse_block(&mut self) -> Node {
        let start = self.cur().span.start;
        self.bump(); // {
        let statements = self.parse_statements(true);
        if self.kind() == TokenKind::RBrace {
            self.bump();
        }
        Node::Block {
            statements,
            span: Span::new(start, self.prev_end()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn program_statements(src: &str) -> Vec<Node> {
        match parse(src) {
            Node::Program { statements, .. } => statements,
            _ => unreachable!(),
        }
    }

    /// Flatten a call/member chain into (base, link names) for assertions.
    fn chain_names(node: &Node) -> (String, Vec<String>) {
        fn walk(node: &Node, links: &mut Vec<String>) -> String {
            match node {
                Node::Call { callee, .. } => walk(callee, links),
                Node::Member {
                    object, property, ..
                } => {
                    let base = walk(object, links);
                    links.push(property.clone());
                    base
                }
                Node::Ident { name, .. } => name.clone(),
                _ => "<expr>".to_string(),
            }
        }
        let mut links = Vec::new();
        let base = walk(node, &mut links);
        (base, links)
    }

    mod chains {
        use super::*;

        #[test]
        fn simple_chain_preserves_call_order() {
            let stmts = program_statements("cy.get('#a').should('be.visible').click();");
            assert_eq!(stmts.len(), 1);
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!("expected expression statement, got {:?}", stmts[0]);
            };
            let (base, links) = chain_names(expr);
            assert_eq!(base, "cy");
            assert_eq!(links, vec!["get", "should", "click"]);
        }

        #[test]
        fn chain_across_lines() {
            let stmts = program_statements("cy.get('#a')\n  .click();");
            assert_eq!(stmts.len(), 1);
        }

        #[test]
        fn string_argument_decoded() {
            let stmts = program_statements("cy.visit('/login');");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!();
            };
            let Node::Call { args, .. } = expr.as_ref() else {
                panic!();
            };
            assert_eq!(args[0].as_str(), Some("/login"));
        }

        #[test]
        fn object_argument_is_opaque() {
            let stmts = program_statements("cy.request({ method: 'POST' });");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!();
            };
            let Node::Call { args, .. } = expr.as_ref() else {
                panic!();
            };
            assert!(matches!(args[0], Node::OpaqueExpr { .. }));
        }

        #[test]
        fn regex_argument_degrades_to_opaque() {
            let stmts = program_statements("cy.url().should('match', /dash/);");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!("regex arg should not break the statement");
            };
            let (_, links) = chain_names(expr);
            assert_eq!(links, vec!["url", "should"]);
        }
    }

    mod functions {
        use super::*;

        #[test]
        fn arrow_callback_parsed() {
            let stmts = program_statements("it('works', () => { cy.visit('/'); });");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!();
            };
            let Node::Call { args, .. } = expr.as_ref() else {
                panic!();
            };
            let Node::Func {
                params,
                is_async,
                body_is_block,
                ..
            } = &args[1]
            else {
                panic!("expected arrow function, got {:?}", args[1]);
            };
            assert!(params.is_empty());
            assert!(!is_async);
            assert!(body_is_block);
        }

        #[test]
        fn async_arrow_with_destructured_param() {
            let stmts =
                program_statements("test('x', async ({ page }) => { await page.goto('/'); });");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!();
            };
            let Node::Call { args, .. } = expr.as_ref() else {
                panic!();
            };
            let Node::Func {
                params, is_async, ..
            } = &args[1]
            else {
                panic!();
            };
            assert!(is_async);
            assert_eq!(params, &vec!["{}".to_string()]);
        }

        #[test]
        fn single_param_arrow() {
            let stmts = program_statements("list.forEach(item => item.click());");
            assert_eq!(stmts.len(), 1);
            assert!(matches!(stmts[0], Node::ExprStmt { .. }));
        }

        #[test]
        fn function_declaration() {
            let stmts = program_statements("async function login(page) {\n  return 1;\n}");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!("expected function statement, got {:?}", stmts[0]);
            };
            let Node::Func { name, is_async, .. } = expr.as_ref() else {
                panic!();
            };
            assert_eq!(name.as_deref(), Some("login"));
            assert!(is_async);
        }
    }

    mod recovery {
        use super::*;

        #[test]
        fn control_flow_header_opaque_but_body_parsed() {
            let stmts = program_statements("if (ready) {\n  cy.visit('/');\n}\ncy.reload();");
            assert_eq!(stmts.len(), 2);
            let Node::Opaque { children, .. } = &stmts[0] else {
                panic!("expected opaque if statement, got {:?}", stmts[0]);
            };
            assert_eq!(children.len(), 1);
            let Node::Block { statements, .. } = &children[0] else {
                panic!();
            };
            assert_eq!(statements.len(), 1);
        }

        #[test]
        fn binary_expression_statement_is_opaque() {
            let stmts = program_statements("a + b;\ncy.reload();");
            assert_eq!(stmts.len(), 2);
            assert!(matches!(stmts[0], Node::Opaque { .. }));
            assert!(matches!(stmts[1], Node::ExprStmt { .. }));
        }

        #[test]
        fn import_statement_opaque() {
            let stmts =
                program_statements("import { test } from '@playwright/test';\ncy.visit('/');");
            assert_eq!(stmts.len(), 2);
            assert!(matches!(stmts[0], Node::Opaque { .. }));
        }

        #[test]
        fn var_decl_with_chain_init() {
            let stmts = program_statements("const user = Cypress.env('username');");
            let Node::VarDecl { name, init, .. } = &stmts[0] else {
                panic!("expected var decl, got {:?}", stmts[0]);
            };
            assert_eq!(name, "user");
            assert!(init.is_some());
        }

        #[test]
        fn unbalanced_input_does_not_panic() {
            let _ = parse("cy.get('#a'");
            let _ = parse("} } }");
            let _ = parse("function (");
        }

        #[test]
        fn await_statement_parses() {
            let stmts = program_statements("await page.waitForTimeout(3000);");
            let Node::ExprStmt { expr, .. } = &stmts[0] else {
                panic!();
            };
            assert!(matches!(expr.as_ref(), Node::AwaitExpr { .. }));
        }
    }

    mod spans {
        use super::*;

        #[test]
        fn sibling_spans_increase_monotonically() {
            let src = "cy.visit('/a');\ncy.visit('/b');\ncy.visit('/c');";
            let stmts = program_statements(src);
            let starts: Vec<_> = stmts.iter().map(|s| s.span().start).collect();
            let mut sorted = starts.clone();
            sorted.sort_unstable();
            assert_eq!(starts, sorted);
        }

        #[test]
        fn statement_span_covers_semicolon() {
            let src = "cy.reload();";
            let stmts = program_statements(src);
            assert_eq!(stmts[0].span(), Span::new(0, src.len()));
        }
    }
}
