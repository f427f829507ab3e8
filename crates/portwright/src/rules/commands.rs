//! Custom command rules: `Cypress.Commands.add` declarations and
//! `Cypress.env` reads.
//!
//! A custom command body cannot be converted mechanically (it runs in the
//! Cypress command queue), so the declaration becomes an async helper stub
//! with the original body carried over as comments, and the site is always
//! flagged for manual review.

use crate::ast::Node;
use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;
use crate::rules::{CaptureValue, Match, RewriteContext, RewriteResult, Rule, RuleCategory};

pub fn register(rules: &mut Vec<Box<dyn Rule>>) {
    rules.push(Box::new(CommandsAdd));
    rules.push(Box::new(CypressEnv));
}

struct CommandsAdd;

impl Rule for CommandsAdd {
    fn id(&self) -> &'static str {
        "command.add"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CustomCommands
    }

    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "Cypress" || view.links.len() != 2 || !ctx.is_statement {
            return None;
        }
        let commands = view.link(0)?;
        if commands.name != "Commands" || commands.args.is_some() {
            return None;
        }
        let add = view.link(1)?;
        if add.name != "add" {
            return None;
        }
        let name = add.str_arg(0)?;

        let mut m = Match::new(self.id(), view.span, 2)
            .heuristic()
            .capture("name", CaptureValue::Text(name.to_string()));

        if let Some(Node::Func {
            params,
            body,
            body_is_block,
            ..
        }) = add.args().get(1)
        {
            if !params.is_empty() {
                m = m.capture("params", CaptureValue::Raw(params.join(", ")));
            }
            if *body_is_block {
                let span = body.span();
                // Interior of the block, braces excluded.
                let lo = (span.start + 1).min(span.end);
                let hi = span.end.saturating_sub(1).max(lo);
                m = m.capture("body", CaptureValue::Raw(ctx.source[lo..hi].to_string()));
            }
        }
        Some(m)
    }

    fn rewrite(&self, m: &Match, ctx: &RewriteContext<'_>) -> RewriteResult {
        let name = m.get("name").as_text();
        let indent = ctx.indent;
        let params = match m.try_get("params") {
            Some(p) => format!("page, {}", p.as_text()),
            None => "page".to_string(),
        };

        let mut out = format!(
            "// TODO(portwright): reimplement custom command '{}' as a helper\n{}async function {}({}) {{\n",
            name, indent, name, params
        );
        if let Some(body) = m.try_get("body") {
            out.push_str(&format!("{}  // original Cypress implementation:\n", indent));
            for line in body.as_text().lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                out.push_str(&format!("{}  // {}\n", indent, line));
            }
        }
        out.push_str(&format!("{}}}", indent));

        let mut result = RewriteResult::replace(JsNode::raw(out));
        result.needs_import = false;
        result.unresolved_reason = Some(format!(
            "custom command '{}' body requires manual conversion",
            name
        ));
        result
    }
}

/// `Cypress.env('NAME')` reads become `process.env` lookups.
struct CypressEnv;

impl Rule for CypressEnv {
    fn id(&self) -> &'static str {
        "command.env"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::CustomCommands
    }

    fn try_match(&self, view: &ChainView<'_>, _ctx: &MatchContext<'_>) -> Option<Match> {
        if view.base != "Cypress" || view.links.len() != 1 {
            return None;
        }
        let env = view.link(0)?;
        if env.name != "env" || env.args().len() != 1 {
            return None;
        }
        let name = env.str_arg(0)?;
        Some(
            Match::new(self.id(), view.span, 1)
                .capture("name", CaptureValue::Text(name.to_string())),
        )
    }

    fn rewrite(&self, m: &Match, _ctx: &RewriteContext<'_>) -> RewriteResult {
        let name = m.get("name").as_text();
        let ident_safe = !name.is_empty()
            && name
                .chars()
                .enumerate()
                .all(|(i, c)| c == '_' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
        let node = if ident_safe {
            JsNode::raw(format!("process.env.{}", name))
        } else {
            JsNode::raw(format!(
                "process.env['{}']",
                crate::printer::escape_js_string(name)
            ))
        };
        let mut result = RewriteResult::replace(node);
        result.needs_import = false;
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
