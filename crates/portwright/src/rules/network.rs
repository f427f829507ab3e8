//! Network rules: waits, route interception, direct requests, fixtures.
//!
//! Most of this category is heuristic by nature. The alias-to-glob
//! mapping guesses a URL pattern from the alias name and is always
//! surfaced as a heuristic match with an advisory note.

use crate::ast::Node;
use crate::matcher::{ChainLink, ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(WaitAlias));
    rules.push(Box::new(WaitTimeout));
    rules.push(Box::new(WaitUntil));
    rules.push(Box::new(Intercept));
    rules.push(Box::new(Request));
    rules.push(Box::new(Fixture));
}

/// Guess a route glob from an alias name. Aliases that look like request
/// names ("getUsers", "apiLogin") have the conventional prefixes stripped;
/// anything else is matched loosely by name.
pub fn alias_route_glob(alias: &str) -> String {
    let lower = alias.to_lowercase();
    if lower.contains("api") || lower.contains("request") || lower.contains("get") {
        let stripped = alias
            .replace("get", "")
            .replace("api", "")
            .replace("data", "")
            .to_lowercase();
        format!("**/*{}*", stripped)
    } else {
        format!("**/{}**", alias)
    }
}

fn single_link<'a, 'v>(view: &'v ChainView<'a>, name: &str) -> Option<&'v ChainLink<'a>> {
    if view.base != "cy" || view.links.len() != 1 {
        return None;
    }
    let link = view.link(0)?;
    (link.name == name && link.args.is_some()).then_some(link)
}

fn raw_args(args: &[Node], ctx: &MatchContext<'_>) -> String {
    args.iter()
        .map(|a| ctx.raw(a))
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// cy.wait
// ============================================================================

struct WaitAlias;

impl Rule for WaitAlias {
    fn id(&self) -> &'static str {
        "network.wait-alias"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "wait")?;
        let alias = link.str_arg(0)?.strip_prefix('@')?;
        Some(
            Match::new(self.id(), view.span, 1)
                .heuristic()
                .capture("glob", CaptureValue::Text(alias_route_glob(alias))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("waitForResponse", vec![m.get("glob").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("route glob guessed from the alias name; verify it matches the request URL")
    }
}

struct WaitTimeout;

impl Rule for WaitTimeout {
    fn id(&self) -> &'static str {
        "network.wait-timeout"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "wait")?;
        let millis = link.num_arg(0)?;
        Some(
            Match::new(self.id(), view.span, 1)
                .capture("millis", CaptureValue::Number(millis.to_string())),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("waitForTimeout", vec![m.get("millis").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("Playwright auto-waits; prefer web-first assertions over fixed timeouts")
    }
}

struct WaitUntil;

impl Rule for WaitUntil {
    fn id(&self) -> &'static str {
        "network.wait-until"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "waitUntil")?;
        if link.args().is_empty() {
            return None;
        }
        Some(
            Match::new(self.id(), view.span, 1)
                .heuristic()
                .capture("args", CaptureValue::Raw(raw_args(link.args(), ctx))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("waitForFunction", vec![m.get("args").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("waitForFunction runs in the page context, not the test context")
    }
}

// ============================================================================
// cy.intercept / cy.request / cy.fixture
// ============================================================================

struct Intercept;

impl Rule for Intercept {
    fn id(&self) -> &'static str {
        "network.intercept"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "intercept")?;
        if link.args().is_empty() {
            return None;
        }
        Some(
            Match::new(self.id(), view.span, 1)
                .heuristic()
                .capture("args", CaptureValue::Raw(raw_args(link.args(), ctx))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page").call("route", vec![m.get("args").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("route handlers must fulfill, continue, or abort the request")
    }
}

struct Request;

impl Rule for Request {
    fn id(&self) -> &'static str {
        "network.request"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let link = single_link(view, "request")?;
        if link.args().is_empty() {
            return None;
        }
        Some(
            Match::new(self.id(), view.span, 1)
                .heuristic()
                .capture("args", CaptureValue::Raw(raw_args(link.args(), ctx))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("page")
            .member("request")
            .call("fetch", vec![m.get("args").to_js()]);
        RewriteResult::replace(node.awaited())
            .awaited()
            .with_note("check the arguments against the APIRequestContext.fetch signature")
    }
}

/// Fixtures have no Playwright equivalent; statement-level uses become a
/// review comment, expression uses are flagged in place.
struct Fixture;

impl Rule for Fixture {
    fn id(&self) -> &'static str {
        "network.fixture"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Network
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let link = view.link(0)?;
        if view.base != "cy" || link.name != "fixture" || link.args.is_none() {
            return None;
        }
        let mut m = Match::new(self.id(), view.span, view.links.len()).heuristic();
        if ctx.is_statement && view.links.len() == 1 {
            m = m.capture(
                "snippet",
                CaptureValue::Raw(portwright_core::text::snippet(ctx.source, &view.span)),
            );
        }
        Some(m)
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        const REASON: &str = "replace cy.fixture with a JSON import or a test data factory";
        match m.try_get("snippet") {
            Some(snippet) => RewriteResult::comment(
                format!("// TODO(portwright): {}: {}", REASON, snippet.as_text()),
                REASON,
            ),
            None => RewriteResult::flag_only(REASON),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
