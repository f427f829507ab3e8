//! Rendering of replacement expressions.
//!
//! Rules build [`JsNode`] trees rather than pasting strings together, so
//! quoting and escaping happen exactly once, at render time. The node set
//! is small on purpose: rules only ever emit call chains, literals, and
//! the occasional `const` binding.

use std::fmt::Write as _;

/// A fragment of target-language output.
#[derive(Debug, Clone)]
pub enum JsNode {
    Ident(String),
    /// String literal; the value is escaped and single-quoted at render.
    Str(String),
    /// Numeric literal carried through verbatim.
    Num(String),
    /// Regex literal body, rendered `/body/`.
    Regex(String),
    /// Pre-rendered text spliced in as-is.
    Raw(String),
    Member(Box<JsNode>, String),
    Call(Box<JsNode>, Vec<JsNode>),
    Await(Box<JsNode>),
    Const { name: String, init: Box<JsNode> },
    /// Several statements replacing a single one; rendered separated by
    /// semicolons and newlines at the original statement's indentation.
    Stmts(Vec<JsNode>),
}

impl JsNode {
    pub fn ident(name: impl Into<String>) -> JsNode {
        JsNode::Ident(name.into())
    }

    pub fn str(value: impl Into<String>) -> JsNode {
        JsNode::Str(value.into())
    }

    pub fn raw(text: impl Into<String>) -> JsNode {
        JsNode::Raw(text.into())
    }

    /// `self.prop`
    pub fn member(self, prop: impl Into<String>) -> JsNode {
        JsNode::Member(Box::new(self), prop.into())
    }

    /// `self.method(args)`
    pub fn call(self, method: impl Into<String>, args: Vec<JsNode>) -> JsNode {
        JsNode::Call(Box::new(self.member(method)), args)
    }

    /// `self(args)`
    pub fn invoke(self, args: Vec<JsNode>) -> JsNode {
        JsNode::Call(Box::new(self), args)
    }

    /// `await self`
    pub fn awaited(self) -> JsNode {
        JsNode::Await(Box::new(self))
    }

    /// Render with the given indentation prefix for continuation lines.
    pub fn render(&self, indent: &str) -> String {
        let mut out = String::new();
        self.write(&mut out, indent);
        out
    }

    fn write(&self, out: &mut String, indent: &str) {
        match self {
            JsNode::Ident(name) => out.push_str(name),
            JsNode::Str(value) => {
                out.push('\'');
                out.push_str(&escape_js_string(value));
                out.push('\'');
            }
            JsNode::Num(raw) => out.push_str(raw),
            JsNode::Regex(body) => {
                out.push('/');
                out.push_str(body);
                out.push('/');
            }
            JsNode::Raw(text) => out.push_str(text),
            JsNode::Member(object, prop) => {
                self.write_receiver(object, out, indent);
                out.push('.');
                out.push_str(prop);
            }
            JsNode::Call(callee, args) => {
                self.write_receiver(callee, out, indent);
                out.push('(');
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    arg.write(out, indent);
                }
                out.push(')');
            }
            JsNode::Await(expr) => {
                out.push_str("await ");
                expr.write(out, indent);
            }
            JsNode::Const { name, init } => {
                let _ = write!(out, "const {} = ", name);
                init.write(out, indent);
            }
            JsNode::Stmts(stmts) => {
                for (i, stmt) in stmts.iter().enumerate() {
                    if i > 0 {
                        out.push_str(";\n");
                        out.push_str(indent);
                    }
                    stmt.write(out, indent);
                }
            }
        }
    }

    /// Write a member/call receiver, parenthesizing `await` so that
    /// `(await x).status()` comes out grouped correctly.
    fn write_receiver(&self, object: &JsNode, out: &mut String, indent: &str) {
        if matches!(object, JsNode::Await(_)) {
            out.push('(');
            object.write(out, indent);
            out.push(')');
        } else {
            object.write(out, indent);
        }
    }
}

/// Escape a string value for inclusion in a single-quoted JS literal.
pub fn escape_js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a literal substring for inclusion in a JS regex literal.
pub fn escape_for_regex(value: &str) -> String {
    regex::escape(value).replace('/', "\\/")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_chain_renders() {
        let node = JsNode::ident("page")
            .call("locator", vec![JsNode::str("#login-button")])
            .call("click", vec![])
            .awaited();
        assert_eq!(node.render(""), "await page.locator('#login-button').click()");
    }

    #[test]
    fn string_escaping_happens_once() {
        let node = JsNode::ident("page").call("locator", vec![JsNode::str("a[name='x']")]);
        assert_eq!(node.render(""), "page.locator('a[name=\\'x\\']')");
    }

    #[test]
    fn await_receiver_is_parenthesized() {
        let node = JsNode::ident("page")
            .call("waitForResponse", vec![JsNode::str("**/users**")])
            .awaited()
            .call("status", vec![]);
        assert_eq!(
            node.render(""),
            "(await page.waitForResponse('**/users**')).status()"
        );
    }

    #[test]
    fn url_regex_assertion_renders() {
        let body = format!(".*{}.*", escape_for_regex("/dashboard"));
        let node = JsNode::ident("expect")
            .invoke(vec![JsNode::ident("page")])
            .call("toHaveURL", vec![JsNode::Regex(body)])
            .awaited();
        assert_eq!(
            node.render(""),
            "await expect(page).toHaveURL(/.*\\/dashboard.*/)"
        );
    }

    #[test]
    fn const_binding_renders() {
        let node = JsNode::Const {
            name: "userRow".to_string(),
            init: Box::new(JsNode::ident("page").call("locator", vec![JsNode::str(".row")])),
        };
        assert_eq!(node.render(""), "const userRow = page.locator('.row')");
    }

    #[test]
    fn statement_sequence_uses_indent() {
        let node = JsNode::Stmts(vec![
            JsNode::raw("await page.locator('#a').click()"),
            JsNode::raw("await expect(page.locator('#a')).toBeVisible()"),
        ]);
        assert_eq!(
            node.render("  "),
            "await page.locator('#a').click();\n  await expect(page.locator('#a')).toBeVisible()"
        );
    }

    #[test]
    fn regex_metacharacters_escaped() {
        assert_eq!(escape_for_regex("/a.b+c"), "\\/a\\.b\\+c");
    }
}
