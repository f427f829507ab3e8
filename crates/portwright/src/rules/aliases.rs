//! Alias rules: `.as('name')` definitions and `cy.get('@name')` uses.
//!
//! Element aliases become `const` locator bindings (locators are lazy, so
//! the binding needs no await). Intercept aliases have no binding
//! equivalent; the route registration is kept and the alias name is noted
//! as dropped, since waits resolve aliases to URL globs instead.

use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::receiver::convert_receiver;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(AliasDefine));
    rules.push(Box::new(AliasUse));
}

struct AliasDefine;

impl Rule for AliasDefine {
    fn id(&self) -> &'static str {
        "alias.define"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Aliases
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        let n = view.links.len();
        if view.base != "cy" || n < 2 || !ctx.is_statement {
            return None;
        }
        let as_link = view.link(n - 1)?;
        if as_link.name != "as" {
            return None;
        }
        let name = as_link.str_arg(0)?;

        // Alias over an intercept: keep the route, drop the binding.
        let head = view.link(0)?;
        if head.name == "intercept" && n == 2 && !head.args().is_empty() {
            let args = head
                .args()
                .iter()
                .map(|a| ctx.raw(a))
                .collect::<Vec<_>>()
                .join(", ");
            return Some(
                Match::new(self.id(), view.span, n)
                    .heuristic()
                    .capture("route_args", CaptureValue::Raw(args))
                    .capture("name", CaptureValue::Text(name.to_string())),
            );
        }

        let receiver = convert_receiver(view, n - 1, ctx)?;
        if receiver.has_action || receiver.alias {
            return None;
        }
        Some(
            Match::new(self.id(), view.span, n)
                .capture("name", CaptureValue::Text(name.to_string()))
                .capture("init", CaptureValue::Raw(receiver.full.render(""))),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let name = m.get("name").as_text();
        if let Some(args) = m.try_get("route_args") {
            let node = JsNode::ident("page").call("route", vec![args.to_js()]).awaited();
            return RewriteResult::replace(node).awaited().with_note(format!(
                "alias '{}' dropped; responses are matched by URL pattern instead",
                name
            ));
        }
        RewriteResult::replace(JsNode::Const {
            name: name.to_string(),
            init: Box::new(m.get("init").to_js()),
        })
    }
}

struct AliasUse;

impl Rule for AliasUse {
    fn id(&self) -> &'static str {
        "alias.use"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Aliases
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.links.is_empty() {
            return None;
        }
        let receiver = convert_receiver(view, view.links.len(), ctx)?;
        if !receiver.alias {
            return None;
        }
        let mut m = Match::new(self.id(), view.span, view.links.len())
            .capture("chain", CaptureValue::Raw(receiver.full.render("")));
        if receiver.has_action {
            m = m.capture("awaited", CaptureValue::Raw(String::new()));
        }
        Some(m)
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let chain = m.get("chain").to_js();
        if m.try_get("awaited").is_some() {
            RewriteResult::replace(chain.awaited()).awaited()
        } else {
            let mut result = RewriteResult::replace(chain);
            // A bare alias reference does not by itself need the import.
            if m.specificity == 1 {
                result.needs_import = false;
            }
            result
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
