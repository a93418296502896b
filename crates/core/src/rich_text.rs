//! JSON rich-text documents to HTML.
//!
//! A document is a tree of `{ "type": ..., "attrs": {...}, "children": [...] }`
//! nodes whose leaves are text nodes (`{ "text": ..., "bold": true, ... }`).
//! Every node type can be overridden through [`RenderOptions`]; the default
//! options render the custom inline `span` node as its children only.

use crate::html::{attr, escape};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Renders one node given the node JSON and its already-rendered children.
pub type NodeRenderer = Box<dyn Fn(&Value, &str) -> String + Send + Sync>;

/// Per-node-type rendering overrides.
pub struct RenderOptions {
    overrides: HashMap<String, NodeRenderer>,
}

impl RenderOptions {
    /// Options without any override, including `span`.
    pub fn empty() -> Self {
        Self {
            overrides: HashMap::new(),
        }
    }

    /// Override how nodes of `node_type` render.
    pub fn with_node<F>(mut self, node_type: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Value, &str) -> String + Send + Sync + 'static,
    {
        self.overrides.insert(node_type.into(), Box::new(render));
        self
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::empty().with_node("span", |_, children| children.to_string())
    }
}

impl fmt::Debug for RenderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.overrides.keys().collect();
        keys.sort();
        f.debug_struct("RenderOptions")
            .field("overrides", &keys)
            .finish()
    }
}

/// Whether `value` is a rich-text document root.
pub fn is_document(value: &Value) -> bool {
    value.get("type").and_then(Value::as_str) == Some("doc")
        && value.get("children").is_some_and(Value::is_array)
}

/// Convert a document (or a multiple-value array of documents) to HTML in
/// place. Returns the number of documents converted.
pub fn convert_in_place(value: &mut Value, options: &RenderOptions) -> usize {
    if is_document(value) {
        *value = Value::String(to_html(value, options));
        return 1;
    }

    if let Value::Array(items) = value
        && !items.is_empty()
        && items.iter().all(is_document)
    {
        for item in items.iter_mut() {
            *item = Value::String(to_html(item, options));
        }
        return items.len();
    }

    0
}

/// Render a document to HTML.
pub fn to_html(document: &Value, options: &RenderOptions) -> String {
    render_children(document, options)
}

fn render_children(node: &Value, options: &RenderOptions) -> String {
    node.get("children")
        .and_then(Value::as_array)
        .map(|children| {
            children
                .iter()
                .map(|child| render_node(child, options))
                .collect()
        })
        .unwrap_or_default()
}

fn render_node(node: &Value, options: &RenderOptions) -> String {
    if let Some(text) = node.get("text").and_then(Value::as_str) {
        return render_text(node, text);
    }

    let node_type = node.get("type").and_then(Value::as_str).unwrap_or("");
    let children = render_children(node, options);

    if let Some(render) = options.overrides.get(node_type) {
        return render(node, &children);
    }

    let attrs = node.get("attrs").cloned().unwrap_or(Value::Null);
    let attr_str = |key: &str| attrs.get(key).and_then(Value::as_str).unwrap_or("");

    match node_type {
        "doc" | "fragment" => children,
        "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "blockquote" | "ul" | "ol" | "li"
        | "table" | "thead" | "tbody" | "tr" | "th" | "td" => {
            format!("<{tag}>{children}</{tag}>", tag = node_type)
        }
        "code" => format!("<pre><code>{}</code></pre>", children),
        "hr" => "<hr />".to_string(),
        "br" | "break" => "<br />".to_string(),
        "a" => {
            let href = if attr_str("url").is_empty() {
                attr_str("href")
            } else {
                attr_str("url")
            };
            format!(
                "<a{}{}>{}</a>",
                attr("href", href),
                attr("target", attr_str("target")),
                children
            )
        }
        "img" => {
            let src = if attr_str("url").is_empty() {
                attr_str("src")
            } else {
                attr_str("url")
            };
            format!("<img{}{} />", attr("src", src), attr("alt", attr_str("alt")))
        }
        "embed" => format!("<iframe{}></iframe>", attr("src", attr_str("src"))),
        "reference" if attr_str("type") == "asset" => format!(
            "<img{}{} />",
            attr("src", attr_str("asset-link")),
            attr("alt", attr_str("asset-name"))
        ),
        _ => {
            tracing::debug!(node_type, "Unknown rich-text node, rendering children only");
            children
        }
    }
}

fn render_text(node: &Value, text: &str) -> String {
    let mut html = escape(text).replace('\n', "<br />");
    let mark = |name: &str| node.get(name).and_then(Value::as_bool).unwrap_or(false);

    let marks = [
        ("inlineCode", "code"),
        ("subscript", "sub"),
        ("superscript", "sup"),
        ("strikethrough", "strike"),
        ("underline", "u"),
        ("italic", "em"),
        ("bold", "strong"),
    ];
    for (name, tag) in marks {
        if mark(name) {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    html
}
