//! Assertion rules: `.should(kind, ...)` on a locator chain.
//!
//! The assertion kind table is closed: an unrecognized kind produces a
//! flag-only match so the chain is surfaced for review instead of being
//! guessed at. Chains whose receiver contains an action link split into
//! two statements (perform the action, then assert on the locator).

use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::receiver::convert_receiver;
use crate::rules::{CaptureValue, Match, Rewrite, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(ShouldAssertion));
}

/// Map a bare (un-negated) Cypress assertion kind to the expect method and
/// whether it takes an argument.
fn assertion_method(kind: &str) -> Option<(&'static str, bool)> {
    match kind {
        "be.visible" => Some(("toBeVisible", false)),
        "exist" => Some(("toBeAttached", false)),
        "contain" => Some(("toContainText", true)),
        "have.text" => Some(("toHaveText", true)),
        "have.value" => Some(("toHaveValue", true)),
        "have.length" => Some(("toHaveCount", true)),
        "be.empty" => Some(("toBeEmpty", false)),
        "be.enabled" => Some(("toBeEnabled", false)),
        "be.disabled" => Some(("toBeDisabled", false)),
        "be.checked" => Some(("toBeChecked", false)),
        "have.class" => Some(("toHaveClass", true)),
        _ => None,
    }
}

struct ShouldAssertion;

impl Rule for ShouldAssertion {
    fn id(&self) -> &'static str {
        "assertion.should"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Assertions
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let n = view.links.len();
        if view.base != "cy" || n < 2 {
            return None;
        }
        let should = view.link(n - 1)?;
        if should.name != "should" {
            return None;
        }
        let receiver = convert_receiver(view, n - 1, ctx)?;
        let kind = should.str_arg(0)?;

        let m = Match::new(self.id(), view.span, n);
        let (negated, bare_kind) = match kind.strip_prefix("not.") {
            Some(rest) => (true, rest),
            None => (false, kind),
        };
        let Some((method, takes_arg)) = assertion_method(bare_kind) else {
            return Some(m.capture(
                "reason",
                CaptureValue::Text(format!("unsupported assertion '{}'", kind)),
            ));
        };
        let value = should.args().get(1);
        if takes_arg != value.is_some() {
            return Some(m.capture(
                "reason",
                CaptureValue::Text(format!("assertion '{}' has unexpected arguments", kind)),
            ));
        }

        let mut m = m
            .capture("target", CaptureValue::Raw(receiver.locator.render("")))
            .capture(
                "method",
                CaptureValue::Raw(if negated {
                    format!("not.{}", method)
                } else {
                    method.to_string()
                }),
            );
        if let Some(value) = value {
            let value = match (value.as_str(), value.as_num()) {
                (Some(s), _) => CaptureValue::Text(s.to_string()),
                (_, Some(raw)) => CaptureValue::Number(raw.to_string()),
                _ => CaptureValue::Raw(ctx.raw(value).to_string()),
            };
            m = m.capture("value", value);
        }
        if receiver.has_action {
            m = m.capture("action", CaptureValue::Raw(receiver.full.render("")));
        }
        Some(m)
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        if let Some(reason) = m.try_get("reason") {
            return RewriteResult::flag_only(reason.as_text().to_string());
        }
        let value = m
            .try_get("value")
            .map(|v| v.to_js().render(""))
            .unwrap_or_default();
        let assertion = JsNode::raw(format!(
            "await expect({}).{}({})",
            m.get("target").as_text(),
            m.get("method").as_text(),
            value
        ));
        let node = match m.try_get("action") {
            Some(action) => JsNode::Stmts(vec![
                JsNode::raw(format!("await {}", action.as_text())),
                assertion,
            ]),
            None => assertion,
        };
        RewriteResult::replace(node).awaited()
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

    fn run(src: &str) -> Option<(Match, RewriteResult)> {
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
        let rule = ShouldAssertion;
        let m = rule.try_match(&view, &ctx)?;
        let result = rule.rewrite(
            &m,
            &RewriteContext {
                source: src,
                indent: "",
            },
        );
        Some((m, result))
    }

    fn rendered(result: &RewriteResult) -> String {
        match &result.rewrite {
            Rewrite::Replace(node) => node.render("  "),
            other => panic!("expected replacement, got {:?}", other),
        }
    }

    #[test]
    fn visible_assertion() {
        let (_, result) = run("cy.get('#banner').should('be.visible');").unwrap();
        assert_eq!(
            rendered(&result),
            "await expect(page.locator('#banner')).toBeVisible()"
        );
        assert!(result.needs_await);
        assert!(result.needs_import);
    }

    #[test]
    fn negated_existence() {
        let (_, result) = run("cy.get('.spinner').should('not.exist');").unwrap();
        assert_eq!(
            rendered(&result),
            "await expect(page.locator('.spinner')).not.toBeAttached()"
        );
    }

    #[test]
    fn contain_with_value() {
        let (_, result) = run("cy.get('h1').should('contain', 'Welcome');").unwrap();
        assert_eq!(
            rendered(&result),
            "await expect(page.locator('h1')).toContainText('Welcome')"
        );
    }

    #[test]
    fn length_becomes_count() {
        let (_, result) = run("cy.get('.row').should('have.length', 3);").unwrap();
        assert_eq!(
            rendered(&result),
            "await expect(page.locator('.row')).toHaveCount(3)"
        );
    }

    #[test]
    fn deep_receiver_chain() {
        let (_, result) =
            run("cy.get('.table').find('tr').eq(1).should('have.text', 'Ada');").unwrap();
        assert_eq!(
            rendered(&result),
            "await expect(page.locator('.table').locator('tr').nth(1)).toHaveText('Ada')"
        );
    }

    #[test]
    fn action_before_assertion_splits_statements() {
        let (_, result) = run("cy.get('#agree').check().should('be.checked');").unwrap();
        assert_eq!(
            rendered(&result),
            "await page.locator('#agree').check();\n  await expect(page.locator('#agree')).toBeChecked()"
        );
    }

    #[test]
    fn alias_receiver_asserts_on_binding() {
        let (_, result) = run("cy.get('@userRow').should('be.visible');").unwrap();
        assert_eq!(rendered(&result), "await expect(userRow).toBeVisible()");
    }

    #[test]
    fn unknown_kind_flags_for_review() {
        let (_, result) = run("cy.get('#a').should('have.attr', 'href');").unwrap();
        assert!(matches!(result.rewrite, Rewrite::NoOp));
        assert_eq!(
            result.unresolved_reason.as_deref(),
            Some("unsupported assertion 'have.attr'")
        );
    }

    #[test]
    fn wrong_arity_flags_for_review() {
        let (_, result) = run("cy.get('#a').should('be.visible', 'oops');").unwrap();
        assert!(matches!(result.rewrite, Rewrite::NoOp));
    }

    #[test]
    fn non_locator_receiver_declines() {
        assert!(run("cy.wrap(value).should('be.visible');").is_none());
    }
}
