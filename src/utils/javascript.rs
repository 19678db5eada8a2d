use crate::core::{Locator, LocatorKind, ScriptArg};
use crate::errors::{ProbeError, Result};
use serde::Deserialize;
use serde_json::Value;

/// Attribute the browser driver stamps on every node it hands out.
pub const REF_ATTRIBUTE: &str = "data-probe-ref";

/// Assigns `arguments[1]` to the value of the field in `arguments[0]`.
pub const SET_VALUE: &str = "arguments[0].value = arguments[1];";

/// Dispatches a click from script, ignoring whatever sits on top of the node.
pub const SCRIPT_CLICK: &str = "arguments[0].click();";

pub const SCROLL_INTO_VIEW: &str = "arguments[0].scrollIntoView({block: 'center', inline: 'center'});";

pub const IS_DISPLAYED: &str = r#"
    const el = arguments[0];
    const style = window.getComputedStyle(el);
    const boxed = el.offsetWidth > 0 || el.offsetHeight > 0 || el.getClientRects().length > 0;
    return boxed && style.visibility !== 'hidden' && style.display !== 'none';
"#;

pub const IS_ENABLED: &str = "return !arguments[0].disabled;";

/// Returns `null` when the centre of `arguments[0]` receives pointer events,
/// otherwise a description of the node that would.
pub const HIT_TEST: &str = r#"
    const el = arguments[0];
    const rect = el.getBoundingClientRect();
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
    if (!hit || hit === el || el.contains(hit)) {
        return null;
    }
    let label = hit.tagName.toLowerCase();
    if (hit.id) { label += '#' + hit.id; }
    for (const c of hit.classList) { label += '.' + c; }
    return label;
"#;

pub const READY_STATE: &str = "return document.readyState;";

/// What every generated script hands back; scripts never let an exception
/// escape so failures keep their JavaScript error name.
#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    /// JavaScript literal for `text`.
    pub fn literal(text: &str) -> String {
        // serde_json string escaping is valid JavaScript
        Value::String(text.to_string()).to_string()
    }

    /// Expression yielding the node stamped with `handle`, or `null`.
    pub fn element_expression(handle: &str) -> String {
        let selector = format!("[{}=\"{}\"]", REF_ATTRIBUTE, handle);
        format!("document.querySelector({})", Self::literal(&selector))
    }

    /// CSS selector for the node stamped with `handle`.
    pub fn element_selector(handle: &str) -> String {
        format!("[{}=\"{}\"]", REF_ATTRIBUTE, handle)
    }

    fn node_list(locator: &Locator) -> String {
        let value = Self::literal(&locator.value);
        match locator.kind {
            LocatorKind::Id => format!(
                "(() => {{ const n = document.getElementById({}); return n ? [n] : []; }})()",
                value
            ),
            LocatorKind::ClassName => {
                format!("Array.from(document.getElementsByClassName({}))", value)
            }
            LocatorKind::TagName => format!("Array.from(document.getElementsByTagName({}))", value),
            LocatorKind::Css => format!("Array.from(document.querySelectorAll({}))", value),
            LocatorKind::XPath => format!(
                r#"(() => {{
                    const found = document.evaluate({}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
                    const nodes = [];
                    for (let i = 0; i < found.snapshotLength; i++) {{
                        const n = found.snapshotItem(i);
                        if (n.nodeType === Node.ELEMENT_NODE) {{ nodes.push(n); }}
                    }}
                    return nodes;
                }})()"#,
                value
            ),
        }
    }

    /// Script that stamps every node matching `locator` and describes it.
    pub fn collect(locator: &Locator) -> String {
        let body = format!(
            r#"
            const nodes = {nodes};
            return nodes.map((n) => {{
                if (!n.hasAttribute('{attr}')) {{
                    window.__probeSeq = (window.__probeSeq || 0) + 1;
                    n.setAttribute('{attr}', String(window.__probeSeq));
                }}
                return {{
                    handle: n.getAttribute('{attr}'),
                    tag: n.tagName,
                    id: n.id || null,
                    classes: Array.from(n.classList),
                    text: (n.innerText || n.textContent || '').replace(/\s+/g, ' ').trim(),
                }};
            }});
            "#,
            nodes = Self::node_list(locator),
            attr = REF_ATTRIBUTE
        );
        Self::wrap(&body, "")
    }

    /// Wraps `code` so it runs with `args` bound to `arguments` and reports
    /// through the JSON envelope.
    pub fn invoke(code: &str, args: &[ScriptArg]) -> Result<String> {
        let mut bound = Vec::with_capacity(args.len());
        let mut checks = String::new();
        for (i, arg) in args.iter().enumerate() {
            match arg {
                ScriptArg::Element(element) => {
                    bound.push(format!("__a{}", i));
                    checks.push_str(&format!(
                        "const __a{i} = {expr};\n\
                         if (!__a{i}) {{ const e = new Error({stale}); e.name = 'StaleElement'; throw e; }}\n",
                        i = i,
                        expr = Self::element_expression(element.handle()),
                        stale = Self::literal(&element.describe()),
                    ));
                }
                ScriptArg::Value(value) => bound.push(serde_json::to_string(value)?),
            }
        }

        let body = format!(
            "return (function() {{ {} }}).apply(null, [{}]);",
            code,
            bound.join(", ")
        );
        Ok(Self::wrap(&body, &checks))
    }

    fn wrap(body: &str, prelude: &str) -> String {
        format!(
            r#"(() => {{
                try {{
                    {prelude}
                    const value = (() => {{ {body} }})();
                    return JSON.stringify({{ ok: true, value: value === undefined ? null : value }});
                }} catch (e) {{
                    return JSON.stringify({{ ok: false, name: e && e.name, error: String(e && e.message || e) }});
                }}
            }})()"#,
            prelude = prelude,
            body = body
        )
    }

    /// Unpacks what a wrapped script returned.
    pub fn unwrap_result(raw: Option<Value>) -> Result<Value> {
        let text = match raw {
            Some(Value::String(text)) => text,
            other => {
                return Err(ProbeError::JavaScriptFailed(format!(
                    "unexpected script result: {:?}",
                    other
                )))
            }
        };

        let envelope: Envelope = serde_json::from_str(&text)?;
        if envelope.ok {
            return Ok(envelope.value);
        }

        let message = envelope.error.unwrap_or_default();
        Err(match envelope.name.as_deref() {
            Some("StaleElement") => ProbeError::StaleElement(message),
            Some("SyntaxError") => ProbeError::InvalidSelector(message),
            _ => ProbeError::JavaScriptFailed(message),
        })
    }
}
