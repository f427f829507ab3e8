//! Element interaction rules: pure locator/action chains with no trailing
//! assertion, alias, or wait link.

use crate::matcher::{ChainView, MatchContext};
use crate::rules::receiver::convert_receiver;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(ElementChain));
}

struct ElementChain;

impl Rule for ElementChain {
    fn id(&self) -> &'static str {
        "element.chain"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Elements
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.links.is_empty() {
            return None;
        }
        let receiver = convert_receiver(view, view.links.len(), ctx)?;
        if receiver.alias {
            // Alias references belong to the alias category.
            return None;
        }
        let mut m = Match::new(self.id(), view.span, view.links.len())
            .capture("chain", CaptureValue::Raw(receiver.full.render("")));
        if receiver.has_action {
            m = m.capture("action", CaptureValue::Raw(String::new()));
        }
        Some(m)
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let chain = m.get("chain").to_js();
        if m.try_get("action").is_some() {
            RewriteResult::replace(chain.awaited()).awaited()
        } else {
            RewriteResult::replace(chain)
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

    fn run(src: &str) -> Option<(RewriteResult, String)> {
        let Node::Program { statements, .. } = parse(src) else {
            unreachable!();
        };
        let Node::ExprStmt { expr, .. } = &statements[0] else {
            panic!("expected expression statement");
        };
        let view = chain_view(expr)?;
        let ctx = MatchContext {
            source: src,
            is_statement: true,
        };
        let rule = ElementChain;
        let m = rule.try_match(&view, &ctx)?;
        let result = rule.rewrite(
            &m,
            &RewriteContext {
                source: src,
                indent: "",
            },
        );
        let text = match &result.rewrite {
            Rewrite::Replace(node) => node.render(""),
            other => panic!("expected replacement, got {:?}", other),
        };
        Some((result, text))
    }

    #[test]
    fn type_becomes_fill_with_await() {
        let (result, text) = run("cy.get('#a').type('hi');").unwrap();
        assert_eq!(text, "await page.locator('#a').fill('hi')");
        assert!(result.needs_await);
    }

    #[test]
    fn bare_locator_is_not_awaited() {
        let (result, text) = run("cy.get('.row').first();").unwrap();
        assert_eq!(text, "page.locator('.row').first()");
        assert!(!result.needs_await);
    }

    #[test]
    fn click_after_contains() {
        let (_, text) = run("cy.contains('Save').click();").unwrap();
        assert_eq!(text, "await page.getByText('Save').click()");
    }

    #[test]
    fn alias_reference_declines() {
        assert!(run("cy.get('@userRow').click();").is_none());
    }

    #[test]
    fn unknown_link_declines() {
        assert!(run("cy.get('#a').trigger('mouseover');").is_none());
    }
}
