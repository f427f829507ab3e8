//! Fallback rule for unrecognized `cy.*` chains.
//!
//! Unknown commands are never deleted or guessed at. Statement-level
//! chains without callback arguments become a review comment; everything
//! else (expression position, or chains carrying callbacks whose bodies
//! still need converting) is left in place and flagged.

use portwright_core::text::snippet;

use crate::matcher::{ChainView, MatchContext};
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(Unknown));
}

struct Unknown;

impl Rule for Unknown {
    fn id(&self) -> &'static str {
        "fallback.unknown"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Fallback
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "cy" || view.links.is_empty() {
            return None;
        }
        let text = snippet(ctx.source, &view.span);
        let mut m =
            Match::new(self.id(), view.span, 0).capture("snippet", CaptureValue::Raw(text));
        // Replacing a chain that carries callbacks would destroy the
        // conversions inside them; those sites are flagged in place.
        if ctx.is_statement && !view.has_function_arg() {
            m = m.capture("comment", CaptureValue::Raw(String::new()));
        }
        Some(m.heuristic())
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let snippet = m.get("snippet").as_text();
        let reason = "unrecognized Cypress command".to_string();
        if m.try_get("comment").is_some() {
            RewriteResult::comment(
                format!("// TODO(portwright): manual review needed: {}", snippet),
                reason,
            )
        } else {
            RewriteResult::flag_only(reason)
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

    fn run(src: &str, is_statement: bool) -> Option<RewriteResult> {
        let Node::Program { statements, .. } = parse(src) else {
            unreachable!();
        };
        let Node::ExprStmt { expr, .. } = &statements[0] else {
            panic!("expected expression statement");
        };
        let view = chain_view(expr)?;
        let ctx = MatchContext {
            source: src,
            is_statement,
        };
        let rule = Unknown;
        let m = rule.try_match(&view, &ctx)?;
        Some(rule.rewrite(
            &m,
            &RewriteContext {
                source: src,
                indent: "",
            },
        ))
    }

    #[test]
    fn statement_becomes_review_comment() {
        let result = run("cy.customThing('x');", true).unwrap();
        let Rewrite::ReplaceWithComment(text) = &result.rewrite else {
            panic!("expected comment rewrite");
        };
        assert_eq!(
            text,
            "// TODO(portwright): manual review needed: cy.customThing('x')"
        );
        assert!(result.unresolved_reason.is_some());
    }

    #[test]
    fn expression_position_is_flag_only() {
        let result = run("cy.customThing('x');", false).unwrap();
        assert!(matches!(result.rewrite, Rewrite::NoOp));
    }

    #[test]
    fn chains_with_callbacks_are_flag_only() {
        let result = run("cy.origin('https://other', () => { cy.visit('/'); });", true).unwrap();
        assert!(matches!(result.rewrite, Rewrite::NoOp));
    }

    #[test]
    fn non_cy_bases_decline() {
        assert!(run("somethingElse.doIt();", true).is_none());
    }
}
