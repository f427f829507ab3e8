//! Match-to-edit planning.
//!
//! Walks the parsed tree, selects one rule per chain, turns the accepted
//! rewrites into an edit list over the original source, and runs the
//! finishing passes: async propagation through enclosing functions,
//! `({ page })` fixture introduction on test callbacks, and the report
//! bookkeeping (applied changes, unresolved items, diagnostics).
//!
//! Input nodes are never mutated; everything is expressed as edits.

use std::collections::{BTreeMap, BTreeSet};

use portwright_core::patch::{Edit, Span};
use portwright_core::report::{
    AppliedChange, Diagnostic, DiagnosticKind, UnresolvedItem,
};
use portwright_core::text::{byte_offset_to_position, snippet};
use tracing::debug;

use crate::ast::Node;
use crate::matcher::{chain_view, indent_at, CallbackKind, ChainView, FnFrame, MatchContext};
use crate::rules::{registry, Rewrite, RewriteContext, RuleCategory};

/// The planned output of one conversion pass, ready for the emitter.
#[derive(Debug, Default)]
pub struct Plan {
    pub edits: Vec<Edit>,
    pub applied: Vec<AppliedChange>,
    pub unresolved: Vec<UnresolvedItem>,
    pub diagnostics: Vec<Diagnostic>,
    /// The output needs the `@playwright/test` import.
    pub needs_import: bool,
    /// An awaited conversion sits at top level with no enclosing function;
    /// the emitter wraps the body in a test block.
    pub needs_wrapper: bool,
}

/// Plan the conversion of a parsed program. `filter` restricts matching to
/// one rule category (partial modes); `None` runs the full registry.
pub fn plan(source: &str, program: &Node, filter: Option<RuleCategory>) -> Plan {
    let mut walker = Walker {
        source,
        filter,
        edits: Vec::new(),
        applied: Vec::new(),
        unresolved: Vec::new(),
        diagnostics: Vec::new(),
        needs_import: false,
        needs_wrapper: false,
        async_inserts: BTreeSet::new(),
        fixture_params: BTreeMap::new(),
        frames: Vec::new(),
    };

    let Node::Program { statements, .. } = program else {
        return Plan::default();
    };
    for stmt in statements {
        walker.walk_statement(stmt);
    }
    walker.finish()
}

struct Walker<'a> {
    source: &'a str,
    filter: Option<RuleCategory>,
    edits: Vec<Edit>,
    applied: Vec<(usize, AppliedChange)>,
    unresolved: Vec<(usize, UnresolvedItem)>,
    diagnostics: Vec<Diagnostic>,
    needs_import: bool,
    needs_wrapper: bool,
    async_inserts: BTreeSet<usize>,
    /// Parameter-list spans to replace with a fixture destructuring
    /// (`({ page })` or `({ browser })`), keyed by start.
    fixture_params: BTreeMap<usize, (Span, &'static str)>,
    frames: Vec<FnFrame>,
}

impl<'a> Walker<'a> {
    fn line_of(&self, offset: usize) -> u32 {
        byte_offset_to_position(self.source, offset).0
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    fn walk_statement(&mut self, stmt: &Node) {
        match stmt {
            Node::Block { statements, .. } | Node::Program { statements, .. } => {
                for s in statements {
                    self.walk_statement(s);
                }
            }
            Node::ExprStmt { expr, .. } => self.visit_expr(expr, true),
            Node::VarDecl { init, .. } => {
                if let Some(init) = init {
                    self.visit_expr(init, false);
                }
            }
            Node::Opaque { children, span } => {
                self.record_opaque(*span);
                for child in children {
                    self.walk_statement(child);
                }
            }
            _ => {}
        }
    }

    /// An unparsed region: passed through untouched, recorded for review.
    fn record_opaque(&mut self, span: Span) {
        let text = snippet(self.source, &span);
        // Pure punctuation residue (stray braces) is not worth reporting.
        if text.chars().all(|c| !c.is_alphanumeric()) {
            return;
        }
        let line = self.line_of(span.start);
        self.unresolved.push((
            span.start,
            UnresolvedItem {
                snippet: text.clone(),
                reason: "not analyzed".to_string(),
                line,
            },
        ));
        self.diagnostics.push(Diagnostic::at_line(
            DiagnosticKind::ParseRegionOpaque,
            format!("region could not be parsed: {}", text),
            line,
        ));
    }

    fn visit_expr(&mut self, expr: &Node, is_statement: bool) {
        match expr {
            Node::Func { .. } => {
                self.visit_func(expr, CallbackKind::Plain);
                return;
            }
            Node::AwaitExpr { expr: inner, .. } => {
                // chain_view looks through awaits; non-chain awaits recurse.
                if chain_view(expr).is_none() {
                    self.visit_expr(inner, false);
                    return;
                }
            }
            _ => {}
        }

        let Some(view) = chain_view(expr) else {
            self.visit_non_chain_children(expr);
            return;
        };

        let ctx = MatchContext {
            source: self.source,
            is_statement,
        };
        let edited_span = self.apply_rules(&view, &ctx);

        // Descend into arguments that survived the rewrite. Arguments the
        // rewrite consumed are carried verbatim; a Cypress chain hiding in
        // one of them would slip through unconverted, so flag it.
        let cb_kind = callback_kind(&view);
        let base_args = view.base_args.unwrap_or(&[]);
        let link_args = view.links.iter().flat_map(|l| l.args());
        for arg in base_args.iter().chain(link_args) {
            if let Some(span) = edited_span {
                if span.contains(&arg.span()) {
                    self.flag_embedded_chain(arg);
                    continue;
                }
            }
            if arg.is_function() {
                self.visit_func(arg, cb_kind);
            } else {
                self.visit_expr(arg, false);
            }
        }
    }

    /// A consumed non-function argument that still contains a `cy.` chain
    /// lands in the output untouched; record it for manual conversion.
    fn flag_embedded_chain(&mut self, arg: &Node) {
        if arg.is_function() || !contains_cy_chain(arg) {
            return;
        }
        let span = arg.span();
        let line = self.line_of(span.start);
        self.unresolved.push((
            span.start,
            UnresolvedItem {
                snippet: snippet(self.source, &span),
                reason: "Cypress chain in argument position carried over verbatim".to_string(),
                line,
            },
        ));
    }

    fn visit_non_chain_children(&mut self, expr: &Node) {
        match expr {
            Node::Call { callee, args, .. } => {
                self.visit_expr(callee, false);
                for arg in args {
                    if arg.is_function() {
                        self.visit_func(arg, CallbackKind::Plain);
                    } else {
                        self.visit_expr(arg, false);
                    }
                }
            }
            Node::Member { object, .. } => self.visit_expr(object, false),
            _ => {}
        }
    }

    fn visit_func(&mut self, func: &Node, kind: CallbackKind) {
        let Some(frame) = FnFrame::from_func(func, kind) else {
            return;
        };
        let Node::Func {
            body, body_is_block, ..
        } = func
        else {
            return;
        };
        self.frames.push(frame);
        if *body_is_block {
            self.walk_statement(body);
        } else {
            self.visit_expr(body, false);
        }
        self.frames.pop();
    }

    // ------------------------------------------------------------------
    // Rule application
    // ------------------------------------------------------------------

    /// Run selection and rewriting for one chain. Returns the edited span
    /// when a textual edit was produced (arguments inside it are spent).
    fn apply_rules(&mut self, view: &ChainView<'_>, ctx: &MatchContext<'_>) -> Option<Span> {
        let selection = registry().select(view, ctx, self.filter)?;
        let rule = registry().rule(selection.index);
        let m = &selection.m;
        let line = self.line_of(m.span.start);

        if let Some(other) = selection.ambiguous_with {
            self.diagnostics.push(Diagnostic::at_line(
                DiagnosticKind::AmbiguousMatch,
                format!(
                    "rules '{}' and '{}' matched the same shape; kept '{}'",
                    m.rule_id, other, m.rule_id
                ),
                line,
            ));
        }

        let indent = indent_at(self.source, m.span.start);
        let result = rule.rewrite(m, &RewriteContext {
            source: self.source,
            indent,
        });
        self.needs_import |= result.needs_import;

        if let Some(reason) = &result.unresolved_reason {
            self.unresolved.push((
                m.span.start,
                UnresolvedItem {
                    snippet: snippet(self.source, &m.span),
                    reason: reason.clone(),
                    line,
                },
            ));
            if rule.category() == RuleCategory::Fallback {
                self.diagnostics.push(Diagnostic::at_line(
                    DiagnosticKind::UnknownCommand,
                    format!("no rule for chain shape '{}'", view.shape()),
                    line,
                ));
            }
        }

        let new_text = match &result.rewrite {
            Rewrite::Replace(node) => node.render(indent),
            Rewrite::ReplaceWithComment(text) => text.clone(),
            Rewrite::NoOp => return None,
        };
        debug!(rule = m.rule_id, line, "applying rewrite");

        self.applied.push((
            m.span.start,
            AppliedChange {
                rule_id: m.rule_id.to_string(),
                original: snippet(self.source, &m.span),
                replacement: new_text.clone(),
                confidence: m.confidence,
                line,
                note: result.note.clone(),
            },
        ));
        self.edits.push(Edit::new(m.span, new_text, m.rule_id));

        if result.needs_await {
            self.propagate_async(m.span);
        }
        Some(m.span)
    }

    /// Make the function containing an awaited conversion async, and give
    /// the nearest enclosing runner callback the fixture that binds the
    /// replacement's `page` reference. Suite callbacks must stay
    /// synchronous, so a converted statement sitting directly in one is
    /// left as is and flagged for a manual move into a test or hook.
    fn propagate_async(&mut self, site: Span) {
        let Some(innermost) = self.frames.last() else {
            self.needs_wrapper = true;
            return;
        };
        if innermost.kind == CallbackKind::Suite {
            let line = self.line_of(site.start);
            self.unresolved.push((
                site.start,
                UnresolvedItem {
                    snippet: snippet(self.source, &site),
                    reason: "awaited call directly inside a suite callback; move it into a \
                             test or hook"
                        .to_string(),
                    line,
                },
            ));
            return;
        }
        if !innermost.is_async {
            self.async_inserts.insert(innermost.insert_offset);
        }
        for frame in self.frames.iter().rev() {
            match frame.kind {
                CallbackKind::Test => {
                    if frame.params_empty {
                        self.fixture_params
                            .insert(frame.params_span.start, (frame.params_span, "({ page })"));
                    }
                    break;
                }
                CallbackKind::AllHook => {
                    // beforeAll/afterAll have no page fixture; inject the
                    // browser and flag the hook once for manual rework.
                    if frame.params_empty
                        && self
                            .fixture_params
                            .insert(frame.params_span.start, (frame.params_span, "({ browser })"))
                            .is_none()
                    {
                        let line = self.line_of(frame.insert_offset);
                        self.unresolved.push((
                            frame.params_span.start,
                            UnresolvedItem {
                                snippet: snippet(self.source, &site),
                                reason: "beforeAll/afterAll hooks receive the browser fixture; \
                                         page references inside need a manually created page"
                                    .to_string(),
                                line,
                            },
                        ));
                    }
                    break;
                }
                CallbackKind::Suite => break,
                CallbackKind::Plain => {}
            }
        }
    }

    // ------------------------------------------------------------------
    // Finishing
    // ------------------------------------------------------------------

    fn finish(mut self) -> Plan {
        for offset in &self.async_inserts {
            self.edits
                .push(Edit::insert(*offset, "async ", "rewrite.async"));
        }
        for (span, fixture) in self.fixture_params.values() {
            self.edits
                .push(Edit::new(*span, *fixture, "rewrite.fixture-param"));
        }

        self.applied.sort_by_key(|(start, _)| *start);
        self.unresolved.sort_by_key(|(start, _)| *start);

        Plan {
            edits: self.edits,
            applied: self.applied.into_iter().map(|(_, c)| c).collect(),
            unresolved: self.unresolved.into_iter().map(|(_, u)| u).collect(),
            diagnostics: self.diagnostics,
            needs_import: self.needs_import,
            needs_wrapper: self.needs_wrapper,
        }
    }
}

/// Classify the function argument of a runner call: test bodies and
/// per-test hooks take `{ page }`, all-hooks only `{ browser }`, and suite
/// callbacks take nothing and must stay synchronous.
fn callback_kind(view: &ChainView<'_>) -> CallbackKind {
    let bare_or_modifier = view.links.is_empty()
        || (view.links.len() == 1 && matches!(view.links[0].name, "only" | "skip"));
    if !bare_or_modifier {
        return CallbackKind::Plain;
    }
    match view.base {
        "it" | "specify" | "test" | "beforeEach" | "afterEach" => CallbackKind::Test,
        "before" | "after" => CallbackKind::AllHook,
        "describe" | "context" => CallbackKind::Suite,
        _ => CallbackKind::Plain,
    }
}

/// Whether any `cy.` chain occurs in the expression, at any depth the
/// parser can see.
fn contains_cy_chain(node: &Node) -> bool {
    if let Some(view) = chain_view(node) {
        if view.base == "cy" {
            return true;
        }
        let base_args = view.base_args.unwrap_or(&[]);
        return base_args
            .iter()
            .chain(view.links.iter().flat_map(|l| l.args()))
            .any(contains_cy_chain);
    }
    match node {
        Node::Call { callee, args, .. } => {
            contains_cy_chain(callee) || args.iter().any(contains_cy_chain)
        }
        Node::Member { object, .. } => contains_cy_chain(object),
        Node::AwaitExpr { expr, .. } => contains_cy_chain(expr),
        _ => false,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use portwright_core::patch::apply_edits;

    fn convert_full(src: &str) -> (String, Plan) {
        let program = parse(src);
        let plan = plan(src, &program, None);
        let out = apply_edits(src, &plan.edits).unwrap();
        (out, plan)
    }

    #[test]
    fn statement_in_test_callback_gains_async_and_fixture() {
        let src = "it('logs in', () => {\n  cy.visit('/login');\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("test('logs in', async ({ page }) => {"));
        assert!(out.contains("await page.goto('/login');"));
        assert!(plan.needs_import);
        assert!(!plan.needs_wrapper);
    }

    #[test]
    fn async_callback_is_not_doubled() {
        let src = "it('x', async ({ page }) => {\n  cy.reload();\n});";
        let (out, _) = convert_full(src);
        assert!(out.contains("async ({ page }) =>"));
        assert!(!out.contains("async async"));
        assert!(out.contains("await page.reload();"));
    }

    #[test]
    fn top_level_await_requests_wrapper() {
        let (out, plan) = convert_full("cy.get('#a').type('hi');");
        assert!(out.contains("await page.locator('#a').fill('hi');"));
        assert!(plan.needs_wrapper);
    }

    #[test]
    fn nested_describe_structure_converts_throughout() {
        let src = "describe('suite', () => {\n  beforeEach(() => {\n    cy.visit('/');\n  });\n  it('works', () => {\n    cy.get('#a').click();\n  });\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("test.describe('suite', () => {"));
        assert!(out.contains("test.beforeEach(async ({ page }) => {"));
        assert!(out.contains("test('works', async ({ page }) => {"));
        assert!(out.contains("await page.locator('#a').click();"));
        assert!(!plan.needs_wrapper);
        // The describe callback itself must not become async.
        assert!(!out.contains("test.describe('suite', async"));
    }

    #[test]
    fn suite_callback_stays_synchronous() {
        let src = "describe('s', () => {\n  cy.visit('/');\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("test.describe('s', () => {"));
        assert!(out.contains("await page.goto('/');"));
        assert!(!out.contains("async"));
        assert!(plan
            .unresolved
            .iter()
            .any(|u| u.reason.contains("suite callback")));
        assert!(!plan.needs_wrapper);
    }

    #[test]
    fn before_hook_gets_browser_fixture_and_is_flagged() {
        let src = "before(() => {\n  cy.visit('/');\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("test.beforeAll(async ({ browser }) => {"));
        assert!(out.contains("await page.goto('/');"));
        assert!(plan
            .unresolved
            .iter()
            .any(|u| u.reason.contains("browser fixture")));
    }

    #[test]
    fn after_hook_gets_browser_fixture() {
        let src = "after(() => {\n  cy.reload();\n});";
        let (out, _) = convert_full(src);
        assert!(out.contains("test.afterAll(async ({ browser }) => {"));
        assert!(out.contains("await page.reload();"));
    }

    #[test]
    fn each_hooks_keep_page_fixture() {
        let src = "beforeEach(() => {\n  cy.visit('/');\n});\nafterEach(() => {\n  cy.reload();\n});";
        let (out, _) = convert_full(src);
        assert!(out.contains("test.beforeEach(async ({ page }) => {"));
        assert!(out.contains("test.afterEach(async ({ page }) => {"));
    }

    #[test]
    fn embedded_chain_in_consumed_argument_is_flagged() {
        let src = "it('x', async ({ page }) => {\n  cy.get(cy.url()).click();\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("await page.locator(cy.url()).click();"));
        assert!(plan
            .unresolved
            .iter()
            .any(|u| u.reason.contains("argument position")));
    }

    #[test]
    fn composite_suppresses_inner_should_descent() {
        let src = "cy.wait('@getData').its('response.statusCode').should('eq', 200);";
        let (out, plan) = convert_full(src);
        assert!(out.contains(
            "expect((await page.waitForResponse('**/getData**')).status()).toBe(200)"
        ));
        assert_eq!(plan.applied.len(), 1);
        assert_eq!(plan.applied[0].rule_id, "composite.wait-status-assert");
    }

    #[test]
    fn unknown_command_flagged_without_corruption() {
        let src = "cy.visit('/a');\ncy.customThing('x');\ncy.reload();";
        let (out, plan) = convert_full(src);
        assert!(out.contains("await page.goto('/a');"));
        assert!(out.contains("// TODO(portwright): manual review needed: cy.customThing('x')"));
        assert!(out.contains("await page.reload();"));
        assert!(!plan.unresolved.is_empty());
        assert!(plan
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::UnknownCommand));
    }

    #[test]
    fn callback_bodies_of_unknown_chains_still_convert() {
        let src = "cy.customWrap(() => {\n  cy.visit('/inner');\n});";
        let (out, plan) = convert_full(src);
        assert!(out.contains("await page.goto('/inner');"));
        assert!(plan
            .unresolved
            .iter()
            .any(|u| u.reason == "unrecognized Cypress command"));
    }

    #[test]
    fn opaque_regions_recorded_and_untouched() {
        let src = "import x from 'y';\nif (flag) {\n  cy.reload();\n}";
        let (out, plan) = convert_full(src);
        assert!(out.contains("import x from 'y';"));
        assert!(out.contains("if (flag) {"));
        assert!(out.contains("await page.reload();"));
        assert!(plan
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::ParseRegionOpaque));
    }

    #[test]
    fn order_of_applied_changes_follows_source() {
        let src = "cy.visit('/a');\ncy.visit('/b');\ncy.visit('/c');";
        let (_, plan) = convert_full(src);
        let lines: Vec<u32> = plan.applied.iter().map(|c| c.line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }

    #[test]
    fn category_filter_limits_edits() {
        let src = "describe('s', () => {\n  cy.visit('/');\n});";
        let program = parse(src);
        let plan = plan(src, &program, Some(RuleCategory::TestStructure));
        let out = apply_edits(src, &plan.edits).unwrap();
        assert!(out.contains("test.describe('s', () => {"));
        assert!(out.contains("cy.visit('/');"));
    }

    #[test]
    fn no_cypress_syntax_means_no_edits() {
        let src = "const x = 1;\nfunction f() { return x; }\n";
        let (out, plan) = convert_full(src);
        assert_eq!(out, src);
        assert!(plan.applied.is_empty());
        assert!(!plan.needs_import);
    }
}
