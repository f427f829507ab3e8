//! Composite-chain rules (highest precedence).
//!
//! These match multi-link idioms whose meaning is more than the sum of
//! their links: a `cy.wait('@alias').its(...).should(...)` chain converts
//! as one unit, and must not additionally trigger the generic assertion
//! rule on the inner `.should` span.

use crate::matcher::{ChainView, MatchContext};
use crate::printer::{escape_for_regex, JsNode};
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(WaitStatusAssert));
    rules.push(Box::new(WaitStatus));
    rules.push(Box::new(UrlAssert));
    rules.push(Box::new(LocationAssert));
}

/// Alias route glob used by the wait-response composites. Unlike the bare
/// `cy.wait('@x')` rule, the status-code composites keep the alias name
/// intact in the glob.
fn plain_glob(alias: &str) -> String {
    format!("**/{}**", alias)
}

fn wait_alias(view: &ChainView<'_>) -> Option<String> {
    let wait = view.link(0)?;
    if wait.name != "wait" {
        return None;
    }
    let arg = wait.str_arg(0)?;
    arg.strip_prefix('@').map(str::to_string)
}

fn its_status(view: &ChainView<'_>) -> bool {
    view.link(1)
        .map(|its| its.name == "its" && its.str_arg(0) == Some("response.statusCode"))
        .unwrap_or(false)
}

/// `(await page.waitForResponse(glob)).status()`
fn status_expr(glob: &str) -> JsNode {
    JsNode::ident("page")
        .call("waitForResponse", vec![JsNode::str(glob)])
        .awaited()
        .call("status", vec![])
}

const GLOB_NOTE: &str = "verify the response URL pattern matches the intercepted request";

// ============================================================================
// cy.wait('@a').its('response.statusCode').should('eq', N)
// ============================================================================

struct WaitStatusAssert;

impl Rule for WaitStatusAssert {
    fn id(&self) -> &'static str {
        "composite.wait-status-assert"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CompositeChains
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" || view.links.len() != 3 || !its_status(view) {
            return None;
        }
        let alias = wait_alias(view)?;
        let should = view.link(2)?;
        if should.name != "should" || !matches!(should.str_arg(0), Some("eq") | Some("equal")) {
            return None;
        }
        let status = should.args().get(1)?;
        let status = match status.as_num() {
            Some(raw) => CaptureValue::Number(raw.to_string()),
            None => CaptureValue::Raw(ctx.raw(status).to_string()),
        };
        Some(
            Match::new(self.id(), view.span, 3)
                .heuristic()
                .capture("glob", CaptureValue::Text(plain_glob(&alias)))
                .capture("status", status),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let node = JsNode::ident("expect")
            .invoke(vec![status_expr(m.get("glob").as_text())])
            .call("toBe", vec![m.get("status").to_js()]);
        RewriteResult::replace(node).awaited().with_note(GLOB_NOTE)
    }
}

// ============================================================================
// cy.wait('@a').its('response.statusCode')
// ============================================================================

struct WaitStatus;

impl Rule for WaitStatus {
    fn id(&self) -> &'static str {
        "composite.wait-status"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CompositeChains
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" || view.links.len() != 2 || !its_status(view) {
            return None;
        }
        let alias = wait_alias(view)?;
        Some(
            Match::new(self.id(), view.span, 2)
                .heuristic()
                .capture("glob", CaptureValue::Text(plain_glob(&alias))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        RewriteResult::replace(status_expr(m.get("glob").as_text()))
            .awaited()
            .with_note(GLOB_NOTE)
    }
}

// ============================================================================
// cy.url().should(...) and cy.location(part).should(...)
// ============================================================================

/// Build the `toHaveURL` argument for a `should(kind, value)` pair, given
/// the regex prefix contributed by the location part ("" for `cy.url()`).
fn url_assert_value(
    kind: &str,
    value: Option<&crate::ast::Node>,
    prefix: &str,
    ctx: &MatchContext<'_>,
) -> Option<CaptureValue> {
    match kind {
        "include" | "contain" => {
            let s = value?.as_str()?;
            Some(CaptureValue::Raw(format!(
                "/.*{}{}.*/",
                prefix,
                escape_for_regex(s)
            )))
        }
        "eq" | "equal" if prefix.is_empty() => {
            let s = value?.as_str()?;
            Some(CaptureValue::Text(s.to_string()))
        }
        "match" if prefix.is_empty() => Some(CaptureValue::Raw(ctx.raw(value?).to_string())),
        _ => None,
    }
}

fn have_url(value: &CaptureValue) -> JsNode {
    JsNode::ident("expect")
        .invoke(vec![JsNode::ident("page")])
        .call("toHaveURL", vec![value.to_js()])
        .awaited()
}

struct UrlAssert;

impl Rule for UrlAssert {
    fn id(&self) -> &'static str {
        "composite.url-assert"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CompositeChains
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" || view.links.len() != 2 {
            return None;
        }
        let url = view.link(0)?;
        if url.name != "url" || !url.args().is_empty() {
            return None;
        }
        let should = view.link(1)?;
        if should.name != "should" {
            return None;
        }
        let kind = should.str_arg(0)?;
        let m = Match::new(self.id(), view.span, 2);
        match url_assert_value(kind, should.args().get(1), "", ctx) {
            Some(value) => Some(m.capture("value", value)),
            None => Some(m.capture("reason", CaptureValue::Text(format!(
                "unsupported URL assertion '{}'",
                kind
            )))),
        }
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        match m.try_get("value") {
            Some(value) => RewriteResult::replace(have_url(value)).awaited(),
            None => RewriteResult::flag_only(m.get("reason").as_text().to_string()),
        }
    }
}

struct LocationAssert;

impl Rule for LocationAssert {
    fn id(&self) -> &'static str {
        "composite.location-assert"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CompositeChains
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" || view.links.len() != 2 {
            return None;
        }
        let location = view.link(0)?;
        if location.name != "location" {
            return None;
        }
        let part = location.str_arg(0)?;
        let prefix = match part {
            "pathname" => "",
            "search" => "\\?.*",
            "hash" => "#",
            _ => return None,
        };
        let should = view.link(1)?;
        if should.name != "should" {
            return None;
        }
        let kind = should.str_arg(0)?;
        let m = Match::new(self.id(), view.span, 2);
        match url_assert_value(kind, should.args().get(1), prefix, ctx) {
            Some(value) => Some(m.capture("value", value)),
            None => Some(m.capture("reason", CaptureValue::Text(format!(
                "unsupported location assertion '{}' on '{}'",
                kind, part
            )))),
        }
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        match m.try_get("value") {
            Some(value) => RewriteResult::replace(have_url(value)).awaited(),
            None => RewriteResult::flag_only(m.get("reason").as_text().to_string()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::matcher::chain_view;
    use crate::parser::parse;
    use crate::rules::Rewrite;
    use portwright_core::report::Confidence;

    fn run(rule: &dyn Rule, src: &str) -> Option<(Match, RewriteResult)> {
        let Node::Program { statements, .. } = parse(src) else {
            unreachable!();
        };
        let Node::ExprStmt { expr, .. } = &statements[0] else {
            panic!("expected expression statement");
        };
        let view = chain_view(expr).unwrap();
        let ctx = MatchContext {
            source: src,
            is_statement: true,
        };
        let m = rule.try_match(&view, &ctx)?;
        let rewrite = rule.rewrite(
            &m,
            &RewriteContext {
                source: src,
                indent: "",
            },
        );
        Some((m, rewrite))
    }

    fn rendered(result: &RewriteResult) -> String {
        match &result.rewrite {
            Rewrite::Replace(node) => node.render(""),
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn wait_status_assert_converts_as_one_unit() {
        let (m, result) = run(
            &WaitStatusAssert,
            "cy.wait('@getData').its('response.statusCode').should('eq', 200);",
        )
        .unwrap();
        assert_eq!(m.confidence, Confidence::Heuristic);
        assert_eq!(m.specificity, 3);
        assert_eq!(
            rendered(&result),
            "expect((await page.waitForResponse('**/getData**')).status()).toBe(200)"
        );
        assert!(result.needs_await);
    }

    #[test]
    fn wait_status_without_assert() {
        let (_, result) = run(
            &WaitStatus,
            "cy.wait('@login').its('response.statusCode');",
        )
        .unwrap();
        assert_eq!(
            rendered(&result),
            "(await page.waitForResponse('**/login**')).status()"
        );
    }

    #[test]
    fn other_its_paths_decline() {
        assert!(run(&WaitStatus, "cy.wait('@login').its('response.body');").is_none());
        assert!(run(&WaitStatusAssert, "cy.wait(500).its('response.statusCode').should('eq', 1);").is_none());
    }

    #[test]
    fn url_include_becomes_regex() {
        let (m, result) = run(&UrlAssert, "cy.url().should('include', '/dashboard');").unwrap();
        assert_eq!(m.confidence, Confidence::Exact);
        assert_eq!(
            rendered(&result),
            "await expect(page).toHaveURL(/.*\\/dashboard.*/)"
        );
    }

    #[test]
    fn url_eq_keeps_string() {
        let (_, result) = run(&UrlAssert, "cy.url().should('eq', 'https://x/y');").unwrap();
        assert_eq!(rendered(&result), "await expect(page).toHaveURL('https://x/y')");
    }

    #[test]
    fn url_match_carries_regex_verbatim() {
        let (_, result) = run(&UrlAssert, "cy.url().should('match', /dash/);").unwrap();
        assert_eq!(rendered(&result), "await expect(page).toHaveURL(/dash/)");
    }

    #[test]
    fn unknown_url_assertion_flags_instead_of_guessing() {
        let (_, result) = run(&UrlAssert, "cy.url().should('have.length', 4);").unwrap();
        assert!(matches!(result.rewrite, Rewrite::NoOp));
        assert!(result.unresolved_reason.is_some());
    }

    #[test]
    fn location_parts_get_prefixes() {
        let (_, result) = run(
            &LocationAssert,
            "cy.location('search').should('include', 'q=1');",
        )
        .unwrap();
        assert_eq!(rendered(&result), "await expect(page).toHaveURL(/.*\\?.*q=1.*/)");
        let (_, result) = run(
            &LocationAssert,
            "cy.location('hash').should('include', 'top');",
        )
        .unwrap();
        assert_eq!(rendered(&result), "await expect(page).toHaveURL(/.*#top.*/)");
    }
}
