//! Chain decomposition for rule matching.
//!
//! Rules never inspect raw `Node` trees. The matcher flattens a call
//! expression into a [`ChainView`]: the base identifier plus the ordered
//! list of member/call links hanging off it. A rule then matches on link
//! names and argument shapes without caring how the chain nests.

use portwright_core::patch::Span;
use portwright_core::text::byte_offset_to_position;

use crate::ast::Node;

/// One `.name(args)` or `.name` link in a chain, in source order.
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'a> {
    pub name: &'a str,
    /// `Some` when the link is called; `None` for a bare member access.
    pub args: Option<&'a [Node]>,
    /// Span from the chain base through the end of this link.
    pub span: Span,
}

impl<'a> ChainLink<'a> {
    pub fn args(&self) -> &'a [Node] {
        self.args.unwrap_or(&[])
    }

    /// First argument's decoded string value, if it is a string literal.
    pub fn str_arg(&self, index: usize) -> Option<&'a str> {
        self.args().get(index).and_then(Node::as_str)
    }

    pub fn num_arg(&self, index: usize) -> Option<&'a str> {
        self.args().get(index).and_then(Node::as_num)
    }
}

/// A call chain flattened for matching: `cy.get('#a').should('be.visible')`
/// becomes base `cy` with links `[get('#a'), should('be.visible')]`. A bare
/// called identifier such as `it('name', fn)` has base `it`, `base_args`
/// set, and no links.
#[derive(Debug, Clone)]
pub struct ChainView<'a> {
    pub base: &'a str,
    /// Arguments when the base identifier itself is called.
    pub base_args: Option<&'a [Node]>,
    /// Span of the bare base identifier.
    pub base_span: Span,
    pub links: Vec<ChainLink<'a>>,
    pub span: Span,
}

impl<'a> ChainView<'a> {
    pub fn link(&self, index: usize) -> Option<&ChainLink<'a>> {
        self.links.get(index)
    }

    /// Link names joined for diagnostics, e.g. `cy.get.should`.
    pub fn shape(&self) -> String {
        let mut out = self.base.to_string();
        for link in &self.links {
            out.push('.');
            out.push_str(link.name);
        }
        out
    }

    /// Whether any argument anywhere in the chain is a function literal.
    pub fn has_function_arg(&self) -> bool {
        let base_args = self.base_args.unwrap_or(&[]);
        base_args.iter().any(Node::is_function)
            || self
                .links
                .iter()
                .any(|l| l.args().iter().any(Node::is_function))
    }

    /// Span of everything through link `index` inclusive.
    pub fn span_through(&self, index: usize) -> Span {
        self.links
            .get(index)
            .map(|l| l.span)
            .unwrap_or(self.base_span)
    }
}

/// Flatten an expression into a chain view. Returns `None` when the base
/// is not a plain identifier (opaque receivers, literals, computed
/// members). An outer `await` is looked through so already-converted
/// statements still decompose, and simply match no rule.
pub fn chain_view(expr: &Node) -> Option<ChainView<'_>> {
    let expr = match expr {
        Node::AwaitExpr { expr, .. } => expr.as_ref(),
        other => other,
    };
    let mut links = Vec::new();
    let (base, base_args, base_span) = decompose(expr, &mut links)?;
    links.reverse();
    Some(ChainView {
        base,
        base_args,
        base_span,
        links,
        span: expr.span(),
    })
}

/// Recurse to the chain base, collecting links innermost-last.
fn decompose<'a>(
    node: &'a Node,
    links: &mut Vec<ChainLink<'a>>,
) -> Option<(&'a str, Option<&'a [Node]>, Span)> {
    match node {
        Node::Ident { name, span } => Some((name, None, *span)),
        Node::Call { callee, args, span } => match callee.as_ref() {
            Node::Ident {
                name,
                span: base_span,
            } => Some((name, Some(args.as_slice()), *base_span)),
            Node::Member {
                object,
                property,
                computed: false,
                ..
            } => {
                links.push(ChainLink {
                    name: property,
                    args: Some(args.as_slice()),
                    span: *span,
                });
                decompose(object, links)
            }
            _ => None,
        },
        Node::Member {
            object,
            property,
            computed: false,
            span,
        } => {
            links.push(ChainLink {
                name: property,
                args: None,
                span: *span,
            });
            decompose(object, links)
        }
        _ => None,
    }
}

// ============================================================================
// Enclosing-function frames
// ============================================================================

/// What role a function literal plays in the test runner, decided by the
/// call it is passed to. Drives the async/fixture finishing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackKind {
    /// Not a runner callback (helpers, `.then` handlers, route handlers).
    Plain,
    /// Callback of `it`/`test`/`beforeEach`/`afterEach`; takes `{ page }`.
    Test,
    /// Callback of `before`/`after`. `beforeAll`/`afterAll` run outside
    /// any test, so the test-scoped `page` fixture is not available and
    /// only `{ browser }` can be injected.
    AllHook,
    /// Callback of `describe`/`context`. Suite callbacks must stay
    /// synchronous and receive no fixtures.
    Suite,
}

/// Where a match sits relative to its enclosing function literals. The
/// rewriter uses frames to propagate `async` outward and to install
/// fixture parameters on runner callbacks.
#[derive(Debug, Clone, Copy)]
pub struct FnFrame {
    /// Offset where `async ` would be inserted (the function's start).
    pub insert_offset: usize,
    pub params_span: Span,
    pub params_empty: bool,
    pub is_async: bool,
    pub kind: CallbackKind,
}

impl FnFrame {
    pub fn from_func(func: &Node, kind: CallbackKind) -> Option<FnFrame> {
        let Node::Func {
            params,
            params_span,
            is_async,
            span,
            ..
        } = func
        else {
            return None;
        };
        Some(FnFrame {
            insert_offset: span.start,
            params_span: *params_span,
            params_empty: params.is_empty(),
            is_async: *is_async,
            kind,
        })
    }
}

/// Per-site context handed to rules during matching.
pub struct MatchContext<'a> {
    pub source: &'a str,
    /// Whether the chain is the entire expression statement.
    pub is_statement: bool,
}

impl<'a> MatchContext<'a> {
    /// Raw source text of a node, for opaque arguments carried verbatim.
    pub fn raw(&self, node: &Node) -> &'a str {
        let span = node.span();
        &self.source[span.start..span.end]
    }

    pub fn line_of(&self, span: Span) -> u32 {
        byte_offset_to_position(self.source, span.start).0
    }
}

/// The whitespace indentation of the line containing `offset`.
pub fn indent_at(source: &str, offset: usize) -> &str {
    let line_start = source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let rest = &source[line_start..];
    let indent_len = rest
        .char_indices()
        .find(|(_, c)| *c != ' ' && *c != '\t')
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    &rest[..indent_len]
}

// ============================================================================
// Tests
// ============================================================================
