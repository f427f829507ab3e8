//! Test structure rules: suite/test/hook callee renames.
//!
//! These edit only the callee identifier span, never the callback, so a
//! file that already says `test.beforeEach` has nothing left to match and
//! can never double-wrap into `test.test.beforeEach`.

use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(Callee));
    rules.push(Box::new(Modifier));
}

fn runner_callee(name: &str) -> Option<&'static str> {
    match name {
        "describe" | "context" => Some("test.describe"),
        "it" | "specify" => Some("test"),
        "beforeEach" => Some("test.beforeEach"),
        "afterEach" => Some("test.afterEach"),
        "before" => Some("test.beforeAll"),
        "after" => Some("test.afterAll"),
        _ => None,
    }
}

struct Callee;

impl Rule for Callee {
    fn id(&self) -> &'static str {
        "structure.callee"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::TestStructure
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        if !view.links.is_empty() || view.base_args.is_none() {
            return None;
        }
        let target = runner_callee(view.base)?;
        Some(
            Match::new(self.id(), view.base_span, 0)
                .capture("callee", CaptureValue::Raw(target.to_string())),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        RewriteResult::replace(JsNode::raw(m.get("callee").as_text().to_string()))
    }
}

/// `it.only(...)` / `describe.skip(...)` keep their modifier.
struct Modifier;

impl Rule for Modifier {
    fn id(&self) -> &'static str {
        "structure.modifier"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::TestStructure
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        if view.links.len() != 1 {
            return None;
        }
        let link = view.link(0)?;
        if !matches!(link.name, "only" | "skip") || link.args.is_none() {
            return None;
        }
        let target = match view.base {
            "describe" | "context" => "test.describe",
            "it" | "specify" => "test",
            _ => return None,
        };
        Some(
            Match::new(self.id(), view.base_span, 1)
                .capture("callee", CaptureValue::Raw(target.to_string())),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        RewriteResult::replace(JsNode::raw(m.get("callee").as_text().to_string()))
    }
}

// ============================================================================
// Tests
// ============================================================================
