use serde::{Deserialize, Serialize};

/// A live-preview session opened by the CMS editor.
///
/// Queries carrying a session are answered with draft content from the
/// preview host instead of the published delivery CDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewSession {
    pub hash: String,
}

impl PreviewSession {
    pub fn new(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }
}

/// A query against the entries of one content type.
///
/// Built with the chained methods:
///
/// ```rust
/// use stacksite_delivery::EntryQuery;
///
/// let query = EntryQuery::new("page")
///     .references(&["page_components.from_blog.featured_blogs"])
///     .rich_text(&["page_components.section_with_html_code.description"])
///     .where_eq("url", "/about");
/// assert_eq!(query.content_type, "page");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryQuery {
    pub content_type: String,
    /// Reference fields to expand, as dot paths.
    pub references: Vec<String>,
    /// Rich-text fields to convert to HTML, as dot paths.
    pub rich_text: Vec<String>,
    /// Equality filter on one field.
    pub filter: Option<(String, String)>,
    pub preview: Option<PreviewSession>,
}

impl EntryQuery {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
            ..Default::default()
        }
    }

    pub fn references(mut self, paths: &[&str]) -> Self {
        self.references.extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn rich_text(mut self, paths: &[&str]) -> Self {
        self.rich_text.extend(paths.iter().map(|p| p.to_string()));
        self
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn preview(mut self, session: Option<PreviewSession>) -> Self {
        self.preview = session;
        self
    }

    /// The `query` parameter value, e.g. `{"url":"/about"}`.
    pub fn filter_json(&self) -> Option<String> {
        self.filter.as_ref().map(|(field, value)| {
            let mut object = serde_json::Map::new();
            object.insert(field.clone(), serde_json::Value::String(value.clone()));
            serde_json::Value::Object(object).to_string()
        })
    }
}
