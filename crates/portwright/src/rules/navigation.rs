//! Navigation rules: page loads, history moves, the standalone `cy.url()`
//! read, and `cy.window()` access.

use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::receiver::js_args;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(Visit));
    rules.push(Box::new(UrlRead));
    rules.push(Box::new(Go));
    rules.push(Box::new(Reload));
    rules.push(Box::new(Window));
}

/// Match helper for single-link `cy.<name>(...)` chains.
fn single_link<'a, 'v>(
    view: &'v ChainView<'a>,
    name: &str,
) -> Option<&'v crate::matcher::ChainLink<'a>> {
    if view.base != "cy" || view.links.len() != 1 {
        return None;
    }
    let link = view.link(0)?;
    (link.name == name && link.args.is_some()).then_some(link)
}

struct Visit;

impl Rule for Visit {
    fn id(&self) -> &'static str {
        "nav.visit"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Navigation
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "visit")?;
        if link.args().is_empty() {
            return None;
        }
        let args = js_args(link.args(), ctx)
            .iter()
            .map(|a| a.render(""))
            .collect::<Vec<_>>()
            .join(", ");
        Some(Match::new(self.id(), view.span, 1).capture("args", CaptureValue::Raw(args)))
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("goto", vec![m.get("args").to_js()]);
        RewriteResult::replace(node.awaited()).awaited()
    }
}

/// Standalone `cy.url()` in expression position reads synchronously.
struct UrlRead;

impl Rule for UrlRead {
    fn id(&self) -> &'static str {
        "nav.url"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Navigation
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "url")?;
        link.args().is_empty().then(|| Match::new(self.id(), view.span, 1))
    }

    fn rewrite(&self, _m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        RewriteResult::replace(JsNode::ident("page").call("url", vec![]))
    }
}

struct Go;

impl Rule for Go {
    fn id(&self) -> &'static str {
        "nav.go"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Navigation
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "go")?;
        let method = match link.str_arg(0)? {
            "back" => "goBack",
            "forward" => "goForward",
            _ => return None,
        };
        Some(
            Match::new(self.id(), view.span, 1)
                .capture("method", CaptureValue::Raw(method.to_string())),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call(m.get("method").as_text().to_string(), vec![]);
        RewriteResult::replace(node.awaited()).awaited()
    }
}

struct Reload;

impl Rule for Reload {
    fn id(&self) -> &'static str {
        "nav.reload"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Navigation
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "reload")?;
        link.args().is_empty().then(|| Match::new(self.id(), view.span, 1))
    }

    fn rewrite(&self, _m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        RewriteResult::replace(JsNode::ident("page").call("reload", vec![]).awaited()).awaited()
    }
}

/// `cy.window()` access runs in the page context. `.then(fn)` carries the
/// callback into `page.evaluate` verbatim; `.its('prop')` reads the
/// property off `window`. Cypress yields the window object to the
/// callback while `page.evaluate` does not, so every form is a heuristic.
struct Window;

impl Rule for Window {
    fn id(&self) -> &'static str {
        "nav.window"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Navigation
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" {
            return None;
        }
        let head = view.link(0)?;
        if head.name != "window" || head.args.is_none() || !head.args().is_empty() {
            return None;
        }
        let target = match view.links.len() {
            1 => "() => window".to_string(),
            2 => {
                let tail = view.link(1)?;
                match tail.name {
                    "then" if tail.args().len() == 1 && tail.args()[0].is_function() => {
                        ctx.raw(&tail.args()[0]).to_string()
                    }
                    "its" => format!("() => window.{}", tail.str_arg(0)?),
                    _ => return None,
                }
            }
            _ => return None,
        };
        Some(
            Match::new(self.id(), view.span, view.links.len())
                .heuristic()
                .capture("target", CaptureValue::Raw(target)),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("evaluate", vec![m.get("target").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("page.evaluate does not yield the window object to its callback")
    }
}

// ============================================================================
// Tests
// ============================================================================
