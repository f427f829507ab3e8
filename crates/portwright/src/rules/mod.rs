//! Transformation rule registry.
//!
//! Rules are process-wide static configuration: the registry is built once
//! behind a `OnceLock` and never mutated afterwards. Each rule declares the
//! chain shape it applies to and a rewrite; the engine picks, per chain,
//! the match with the highest category precedence, breaking ties by
//! specificity (links consumed) and then registration order. A residual
//! exact tie on the same span is resolved deterministically but reported
//! so rule-table regressions show up in test suites.

pub mod aliases;
pub mod assertions;
pub mod commands;
pub mod composite;
pub mod elements;
pub mod fallback;
pub mod navigation;
pub mod network;
pub mod receiver;
pub mod structure;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use portwright_core::patch::Span;
use portwright_core::report::Confidence;
use serde::{Deserialize, Serialize};

use crate::matcher::{ChainView, MatchContext};
use crate::printer::JsNode;

// ============================================================================
// Categories
// ============================================================================

/// Rule categories, each with a fixed precedence. Higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleCategory {
    CompositeChains,
    Assertions,
    Navigation,
    Elements,
    Network,
    Aliases,
    CustomCommands,
    TestStructure,
    Fallback,
}

impl RuleCategory {
    pub fn precedence(self) -> u16 {
        match self {
            RuleCategory::CompositeChains => 100,
            RuleCategory::Assertions => 80,
            RuleCategory::Navigation => 60,
            RuleCategory::Elements => 50,
            RuleCategory::Network => 40,
            RuleCategory::Aliases => 30,
            RuleCategory::CustomCommands => 20,
            RuleCategory::TestStructure => 15,
            RuleCategory::Fallback => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RuleCategory::CompositeChains => "composite-chains",
            RuleCategory::Assertions => "assertions",
            RuleCategory::Navigation => "navigation",
            RuleCategory::Elements => "elements",
            RuleCategory::Network => "network",
            RuleCategory::Aliases => "aliases",
            RuleCategory::CustomCommands => "custom-commands",
            RuleCategory::TestStructure => "test-structure",
            RuleCategory::Fallback => "fallback",
        }
    }

    /// Parse a category name as used in conversion modes. The fallback
    /// category is internal and not addressable as a mode.
    pub fn from_mode_name(name: &str) -> Option<RuleCategory> {
        match name {
            "composite-chains" => Some(RuleCategory::CompositeChains),
            "assertions" => Some(RuleCategory::Assertions),
            "navigation" => Some(RuleCategory::Navigation),
            "elements" => Some(RuleCategory::Elements),
            "network" => Some(RuleCategory::Network),
            "aliases" => Some(RuleCategory::Aliases),
            "custom-commands" => Some(RuleCategory::CustomCommands),
            "test-structure" => Some(RuleCategory::TestStructure),
            _ => None,
        }
    }
}

// ============================================================================
// Matches
// ============================================================================

/// A value captured at match time. Everything a rewrite needs is captured
/// as owned data here, so rewrites never re-inspect the tree.
#[derive(Debug, Clone)]
pub enum CaptureValue {
    /// A decoded string value (will be re-quoted and escaped on render).
    Text(String),
    /// Verbatim source text spliced through unchanged.
    Raw(String),
    /// A numeric literal's raw text.
    Number(String),
}

impl CaptureValue {
    pub fn to_js(&self) -> JsNode {
        match self {
            CaptureValue::Text(s) => JsNode::Str(s.clone()),
            CaptureValue::Raw(s) => JsNode::Raw(s.clone()),
            CaptureValue::Number(s) => JsNode::Num(s.clone()),
        }
    }

    pub fn as_text(&self) -> &str {
        match self {
            CaptureValue::Text(s) | CaptureValue::Raw(s) | CaptureValue::Number(s) => s,
        }
    }
}

/// A successful pattern match, produced by `try_match` and consumed by
/// `rewrite`. Lives only within one pipeline pass.
#[derive(Debug, Clone)]
pub struct Match {
    pub rule_id: &'static str,
    /// The span the rewrite will replace.
    pub span: Span,
    /// Number of chain links the match consumed; more specific wins.
    pub specificity: usize,
    pub confidence: Confidence,
    pub captures: BTreeMap<&'static str, CaptureValue>,
}

impl Match {
    pub fn new(rule_id: &'static str, span: Span, specificity: usize) -> Match {
        Match {
            rule_id,
            span,
            specificity,
            confidence: Confidence::Exact,
            captures: BTreeMap::new(),
        }
    }

    pub fn heuristic(mut self) -> Match {
        self.confidence = Confidence::Heuristic;
        self
    }

    pub fn capture(mut self, name: &'static str, value: CaptureValue) -> Match {
        self.captures.insert(name, value);
        self
    }

    pub fn get(&self, name: &'static str) -> &CaptureValue {
        &self.captures[name]
    }

    pub fn try_get(&self, name: &'static str) -> Option<&CaptureValue> {
        self.captures.get(name)
    }
}

// ============================================================================
// Rewrites
// ============================================================================

/// What a rule does with its match.
#[derive(Debug, Clone)]
pub enum Rewrite {
    /// Replace the matched span with rendered output.
    Replace(JsNode),
    /// Replace the matched span with a review comment.
    ReplaceWithComment(String),
    /// Leave the span untouched (flag-only rules).
    NoOp,
}

/// The rewrite plus the bookkeeping the engine needs to finish the job.
#[derive(Debug, Clone)]
pub struct RewriteResult {
    pub rewrite: Rewrite,
    /// The replacement contains or requires `await`; enclosing functions
    /// must become async.
    pub needs_await: bool,
    /// The output requires the `@playwright/test` import.
    pub needs_import: bool,
    /// Advisory note surfaced on the applied-change entry.
    pub note: Option<String>,
    /// When set, the site is recorded as needing manual review.
    pub unresolved_reason: Option<String>,
}

impl RewriteResult {
    pub fn replace(node: JsNode) -> RewriteResult {
        RewriteResult {
            rewrite: Rewrite::Replace(node),
            needs_await: false,
            needs_import: true,
            note: None,
            unresolved_reason: None,
        }
    }

    pub fn comment(text: impl Into<String>, reason: impl Into<String>) -> RewriteResult {
        RewriteResult {
            rewrite: Rewrite::ReplaceWithComment(text.into()),
            needs_await: false,
            needs_import: false,
            note: None,
            unresolved_reason: Some(reason.into()),
        }
    }

    pub fn flag_only(reason: impl Into<String>) -> RewriteResult {
        RewriteResult {
            rewrite: Rewrite::NoOp,
            needs_await: false,
            needs_import: false,
            note: None,
            unresolved_reason: Some(reason.into()),
        }
    }

    pub fn awaited(mut self) -> RewriteResult {
        self.needs_await = true;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> RewriteResult {
        self.note = Some(note.into());
        self
    }
}

/// Context handed to rewrites: source text plus the indentation of the
/// line the match starts on, for multi-line replacements.
pub struct RewriteContext<'a> {
    pub source: &'a str,
    pub indent: &'a str,
}

// ============================================================================
// Rule trait and registry
// ============================================================================

pub trait Rule: Send + Sync {
    fn id(&self) -> &'static str;
    fn category(&self) -> RuleCategory;
    /// Match against a flattened chain; `None` means not applicable.
    fn try_match(&self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Match>;
    /// Turn an accepted match into a rewrite. Pure over the match captures.
    fn rewrite(&self, m: &Match, ctx: &RewriteContext<'_>) -> RewriteResult;
}

pub struct RuleSet {
    rules: Vec<Box<dyn Rule>>,
}

/// The winning rule for one chain.
pub struct Selection {
    pub index: usize,
    pub m: Match,
    /// Id of a distinct rule that matched the same span at the same
    /// precedence and specificity; resolved by registration order.
    pub ambiguous_with: Option<&'static str>,
}

impl RuleSet {
    pub fn rule(&self, index: usize) -> &dyn Rule {
        self.rules[index].as_ref()
    }

    /// Select the best match for a chain, if any. `filter` restricts the
    /// run to a single category (partial-conversion modes).
    pub fn select(
        &self,
        view: &ChainView<'_>,
        ctx: &MatchContext<'_>,
        filter: Option<RuleCategory>,
    ) -> Option<Selection> {
        let mut best: Option<(usize, Match, u16)> = None;
        let mut ambiguous_with = None;

        for (index, rule) in self.rules.iter().enumerate() {
            if let Some(category) = filter {
                if rule.category() != category {
                    continue;
                }
            }
            let Some(m) = rule.try_match(view, ctx) else {
                continue;
            };
            let precedence = rule.category().precedence();
            match &best {
                None => best = Some((index, m, precedence)),
                Some((_, current, current_precedence)) => {
                    let key = (precedence, m.specificity);
                    let current_key = (*current_precedence, current.specificity);
                    if key > current_key {
                        best = Some((index, m, precedence));
                        ambiguous_with = None;
                    } else if key == current_key && m.span == current.span {
                        // Registration order keeps the earlier rule.
                        ambiguous_with = Some(rule.id());
                    }
                }
            }
        }

        best.map(|(index, m, _)| Selection {
            index,
            m,
            ambiguous_with,
        })
    }
}

/// The process-wide rule registry, built once.
pub fn registry() -> &'static RuleSet {
    static REGISTRY: OnceLock<RuleSet> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        composite::register(&mut rules);
        assertions::register(&mut rules);
        navigation::register(&mut rules);
        elements::register(&mut rules);
        network::register(&mut rules);
        aliases::register(&mut rules);
        commands::register(&mut rules);
        structure::register(&mut rules);
        fallback::register(&mut rules);
        RuleSet { rules }
    })
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

    fn view_of(src: &str) -> (Node, bool) {
        let Node::Program { statements, .. } = parse(src) else {
            unreachable!();
        };
        let stmt = statements.into_iter().next().unwrap();
        match stmt {
            Node::ExprStmt { expr, .. } => (*expr, true),
            other => (other, false),
        }
    }

    #[test]
    fn precedence_ordering_is_total() {
        let cats = [
            RuleCategory::CompositeChains,
            RuleCategory::Assertions,
            RuleCategory::Navigation,
            RuleCategory::Elements,
            RuleCategory::Network,
            RuleCategory::Aliases,
            RuleCategory::CustomCommands,
            RuleCategory::TestStructure,
            RuleCategory::Fallback,
        ];
        for pair in cats.windows(2) {
            assert!(pair[0].precedence() > pair[1].precedence());
        }
    }

    #[test]
    fn mode_names_round_trip() {
        for cat in [
            RuleCategory::Assertions,
            RuleCategory::Navigation,
            RuleCategory::TestStructure,
        ] {
            assert_eq!(RuleCategory::from_mode_name(cat.name()), Some(cat));
        }
        assert_eq!(RuleCategory::from_mode_name("fallback"), None);
        assert_eq!(RuleCategory::from_mode_name("everything"), None);
    }

    #[test]
    fn composite_outranks_constituents() {
        let src = "cy.wait('@getData').its('response.statusCode').should('eq', 200);";
        let (expr, is_statement) = view_of(src);
        let view = chain_view(&expr).unwrap();
        let ctx = MatchContext {
            source: src,
            is_statement,
        };
        let selection = registry().select(&view, &ctx, None).unwrap();
        let rule = registry().rule(selection.index);
        assert_eq!(rule.category(), RuleCategory::CompositeChains);
        assert!(selection.ambiguous_with.is_none());
    }

    #[test]
    fn category_filter_excludes_other_rules() {
        let src = "cy.visit('/login');";
        let (expr, is_statement) = view_of(src);
        let view = chain_view(&expr).unwrap();
        let ctx = MatchContext {
            source: src,
            is_statement,
        };
        assert!(registry()
            .select(&view, &ctx, Some(RuleCategory::Assertions))
            .is_none());
        assert!(registry()
            .select(&view, &ctx, Some(RuleCategory::Navigation))
            .is_some());
    }

    #[test]
    fn no_rule_matches_converted_output() {
        let src = "await page.goto('/login');";
        let (expr, is_statement) = view_of(src);
        let view = chain_view(&expr).unwrap();
        let ctx = MatchContext {
            source: src,
            is_statement,
        };
        assert!(registry().select(&view, &ctx, None).is_none());
    }
}
