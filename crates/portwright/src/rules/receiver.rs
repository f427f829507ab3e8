//! Locator-chain conversion shared by the element, assertion, and alias
//! rules.
//!
//! A "receiver" is the part of a Cypress chain that selects and acts on
//! elements: `cy.get('#a').find('.b').type('hi')`. This module converts it
//! into the Playwright locator chain, tracking whether any action link is
//! present (actions make the enclosing statement awaited) and keeping the
//! pure locator prefix available for `expect(...)` targets.

use crate::ast::Node;
use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;

#[derive(Debug, Clone)]
pub struct Receiver {
    /// The entire converted chain, actions included.
    pub full: JsNode,
    /// The locator prefix before the first action link.
    pub locator: JsNode,
    pub has_action: bool,
    /// The chain base was an alias reference (`cy.get('@name')`).
    pub alias: bool,
}

/// Convert `view.links[..upto]` into a Playwright receiver. Returns `None`
/// when the chain is not a recognizable locator chain; the caller's rule
/// then simply does not match.
pub fn convert_receiver(
    view: &ChainView<'_>,
    upto: usize,
    ctx: &MatchContext<'_>,
) -> Option<Receiver> {
    if view.base != "cy" || upto == 0 || view.links.len() < upto {
        return None;
    }

    let head = view.link(0)?;
    let mut alias = false;
    let mut node = match (head.name, head.args) {
        ("get", Some(args)) if args.len() == 1 => match args[0].as_str() {
            Some(sel) if sel.starts_with('@') => {
                alias = true;
                JsNode::ident(sel.trim_start_matches('@'))
            }
            _ => JsNode::ident("page").call("locator", js_args(args, ctx)),
        },
        ("contains", Some(args)) if args.len() == 1 => {
            JsNode::ident("page").call("getByText", js_args(args, ctx))
        }
        ("contains", Some(args)) if args.len() == 2 => JsNode::ident("page")
            .call("locator", js_args(&args[..1], ctx))
            .call("getByText", js_args(&args[1..], ctx)),
        _ => return None,
    };

    let mut locator = node.clone();
    let mut has_action = false;

    for link in &view.links[1..upto] {
        let args = link.args?;
        let (name, action) = match link.name {
            "find" => ("locator", false),
            "eq" => ("nth", false),
            "first" => ("first", false),
            "last" => ("last", false),
            "contains" => ("getByText", false),
            "type" => ("fill", true),
            "select" => ("selectOption", true),
            "click" | "dblclick" | "check" | "uncheck" | "clear" | "focus" | "blur" => {
                (link.name, true)
            }
            _ => return None,
        };
        node = node.call(name, js_args(args, ctx));
        if action {
            has_action = true;
        } else if !has_action {
            locator = node.clone();
        }
    }

    Some(Receiver {
        full: node,
        locator,
        has_action,
        alias,
    })
}

/// Convert call arguments to output nodes: literals are rebuilt (escaping
/// happens once, in the printer), everything else is carried verbatim.
pub fn js_args(args: &[Node], ctx: &MatchContext<'_>) -> Vec<JsNode> {
    args.iter()
        .map(|arg| match arg {
            Node::Str { value, .. } => JsNode::Str(value.clone()),
            Node::Num { raw, .. } => JsNode::Num(raw.clone()),
            _ => JsNode::Raw(ctx.raw(arg).to_string()),
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
