//! Entry resolvers: one fixed query shape per content type the site renders.

use crate::client::ContentClient;
use crate::error::Result;
use crate::query::{EntryQuery, PreviewSession};
use serde_json::Value;
use stacksite_core::{CmsSettings, Entry, conformance, edit_tags};
use std::sync::Arc;

/// Reference and rich-text paths requested for one content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentTypeSpec {
    pub uid: &'static str,
    pub references: &'static [&'static str],
    pub rich_text: &'static [&'static str],
}

impl ContentTypeSpec {
    fn query(&self) -> EntryQuery {
        EntryQuery::new(self.uid)
            .references(self.references)
            .rich_text(self.rich_text)
    }
}

pub const HEADER: ContentTypeSpec = ContentTypeSpec {
    uid: "header",
    references: &["navigation_menu.page_reference"],
    rich_text: &["notification_bar.announcement_text"],
};

pub const FOOTER: ContentTypeSpec = ContentTypeSpec {
    uid: "footer",
    references: &[],
    rich_text: &["copyright"],
};

pub const ALL_PAGES: ContentTypeSpec = ContentTypeSpec {
    uid: "page",
    references: &[],
    rich_text: &[],
};

pub const PAGE: ContentTypeSpec = ContentTypeSpec {
    uid: "page",
    references: &["page_components.from_blog.featured_blogs"],
    rich_text: &[
        "page_components.from_blog.featured_blogs.body",
        "page_components.section_with_buttons.buttons.description",
        "page_components.section_with_html_code.description",
    ],
};

pub const BLOG_LIST: ContentTypeSpec = ContentTypeSpec {
    uid: "blog_post",
    references: &["author", "related_post"],
    rich_text: &["body", "related_post.body"],
};

pub const BLOG_POST: ContentTypeSpec = ContentTypeSpec {
    uid: "blog_post",
    references: &["author", "related_post"],
    rich_text: &["body", "related_post.body"],
};

/// Every resolver shape, labelled for reports.
pub const ALL_SPECS: [(&str, ContentTypeSpec); 6] = [
    ("header", HEADER),
    ("footer", FOOTER),
    ("all_pages", ALL_PAGES),
    ("page", PAGE),
    ("blog_list", BLOG_LIST),
    ("blog_post", BLOG_POST),
];

/// Blog posts split by archive flag, each in delivery order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogListing {
    pub recent: Vec<Entry>,
    pub archived: Vec<Entry>,
}

/// Fetches the entries a page needs and prepares them for rendering.
///
/// Applies live-edit markers when enabled and logs every content-shape
/// mismatch the conformance scan finds.
#[derive(Clone)]
pub struct Resolver {
    client: ContentClient,
    locale: String,
    live_edit_tags: bool,
    preview: Option<PreviewSession>,
}

impl Resolver {
    pub fn new(client: ContentClient, locale: impl Into<String>, live_edit_tags: bool) -> Self {
        Self {
            client,
            locale: locale.into(),
            live_edit_tags,
            preview: None,
        }
    }

    pub fn from_settings(settings: Arc<CmsSettings>) -> Result<Self> {
        let locale = settings.locale.clone();
        let live_edit_tags = settings.live_edit_tags;
        let client = ContentClient::from_settings(settings)?;
        Ok(Self::new(client, locale, live_edit_tags))
    }

    /// A copy of this resolver that reads draft content for a preview session.
    pub fn with_preview(&self, preview: Option<PreviewSession>) -> Self {
        Self {
            preview,
            ..self.clone()
        }
    }

    pub fn live_edit_tags(&self) -> bool {
        self.live_edit_tags
    }

    /// All entries of a content type, resolved with `spec`.
    pub async fn resolve_all(&self, spec: &ContentTypeSpec) -> Result<Vec<Entry>> {
        let query = spec.query().preview(self.preview.clone());
        let entries = self.client.fetch(&query).await?;
        entries.into_iter().map(|e| self.finish(spec, e)).collect()
    }

    /// The entry of `spec`'s content type whose `url` equals `url`.
    pub async fn resolve_by_url(&self, spec: &ContentTypeSpec, url: &str) -> Result<Option<Entry>> {
        let query = spec
            .query()
            .where_eq("url", url)
            .preview(self.preview.clone());
        match self.client.fetch_first(&query).await? {
            Some(entry) => Ok(Some(self.finish(spec, entry)?)),
            None => Ok(None),
        }
    }

    /// The site header. A stack without one yields `None`.
    pub async fn header(&self) -> Result<Option<Entry>> {
        Ok(self.resolve_all(&HEADER).await?.into_iter().next())
    }

    pub async fn footer(&self) -> Result<Option<Entry>> {
        Ok(self.resolve_all(&FOOTER).await?.into_iter().next())
    }

    pub async fn all_pages(&self) -> Result<Vec<Entry>> {
        self.resolve_all(&ALL_PAGES).await
    }

    pub async fn page(&self, url: &str) -> Result<Option<Entry>> {
        self.resolve_by_url(&PAGE, url).await
    }

    pub async fn blog_list(&self) -> Result<BlogListing> {
        let (archived, recent): (Vec<Entry>, Vec<Entry>) = self
            .resolve_all(&BLOG_LIST)
            .await?
            .into_iter()
            .partition(|entry| entry.get("is_archived").and_then(Value::as_bool) == Some(true));
        Ok(BlogListing { recent, archived })
    }

    pub async fn blog_post(&self, url: &str) -> Result<Option<Entry>> {
        self.resolve_by_url(&BLOG_POST, url).await
    }

    fn finish(&self, spec: &ContentTypeSpec, entry: Entry) -> Result<Entry> {
        let locale = if entry.locale.is_empty() {
            self.locale.clone()
        } else {
            entry.locale.clone()
        };
        let mut value = entry.to_value();

        if self.live_edit_tags {
            edit_tags::add_editable_tags(&mut value, spec.uid, &locale);
        }

        for finding in conformance::scan(&value) {
            tracing::warn!(
                content_type = spec.uid,
                entry_uid = %entry.uid,
                path = %finding.path,
                "{}",
                finding
            );
        }

        Ok(Entry::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(text: &str) -> Value {
        json!({"type": "doc", "children": [{"type": "p", "children": [{"text": text}]}]})
    }

    fn fixtures() -> Arc<MemoryTransport> {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert(
            "page",
            json!({
                "uid": "home",
                "locale": "en-us",
                "title": "Home",
                "url": "/",
                "page_components": []
            }),
        );
        transport.insert("author", json!({"uid": "a1", "title": "Ada"}));
        transport.insert(
            "blog_post",
            json!({
                "uid": "b1",
                "locale": "en-us",
                "title": "Fresh",
                "url": "/blog/fresh",
                "body": doc("new"),
                "author": [{"uid": "a1", "_content_type_uid": "author"}],
                "related_post": []
            }),
        );
        transport.insert(
            "blog_post",
            json!({
                "uid": "b2",
                "locale": "en-us",
                "title": "Old",
                "url": "/blog/old",
                "is_archived": true,
                "body": doc("old"),
                "author": [],
                "related_post": [{"uid": "b1", "_content_type_uid": "blog_post"}]
            }),
        );
        transport
    }

    fn resolver(transport: Arc<MemoryTransport>, edit_tags: bool) -> Resolver {
        Resolver::new(ContentClient::new(transport), "en-us", edit_tags)
    }

    #[tokio::test]
    async fn page_lookup_is_idempotent() {
        let resolver = resolver(fixtures(), true);
        let first = resolver.page("/").await.unwrap();
        let second = resolver.page("/").await.unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn missing_page_is_none() {
        let resolver = resolver(fixtures(), false);
        assert_eq!(resolver.page("/about").await.unwrap(), None);
    }

    #[tokio::test]
    async fn edit_tags_only_when_enabled() {
        let tagged = resolver(fixtures(), true).page("/").await.unwrap().unwrap();
        assert_eq!(
            tagged.get("$").unwrap()["title"]["data-cslp"],
            "page.home.en-us.title"
        );

        let plain = resolver(fixtures(), false).page("/").await.unwrap().unwrap();
        assert!(plain.get("$").is_none());
    }

    #[tokio::test]
    async fn blog_list_splits_archived_posts() {
        let listing = resolver(fixtures(), false).blog_list().await.unwrap();
        assert_eq!(listing.recent.len(), 1);
        assert_eq!(listing.recent[0].uid, "b1");
        assert_eq!(listing.archived.len(), 1);
        assert_eq!(listing.archived[0].uid, "b2");
    }

    #[tokio::test]
    async fn blog_post_expands_and_converts_related_posts() {
        let post = resolver(fixtures(), false)
            .blog_post("/blog/old")
            .await
            .unwrap()
            .unwrap();
        let related = &post.get("related_post").unwrap()[0];
        assert_eq!(related["title"], "Fresh");
        assert_eq!(related["body"], "<p>new</p>");
        assert_eq!(post.get("body"), Some(&json!("<p>old</p>")));
    }

    #[tokio::test]
    async fn blog_list_converts_related_post_bodies() {
        let listing = resolver(fixtures(), false).blog_list().await.unwrap();
        let related = &listing.archived[0].get("related_post").unwrap()[0];
        assert_eq!(related["title"], "Fresh");
        assert_eq!(related["body"], "<p>new</p>");
    }

    #[tokio::test]
    async fn page_block_rich_text_paths_become_html() {
        let transport = fixtures();
        transport.insert(
            "page",
            json!({
                "uid": "landing",
                "locale": "en-us",
                "title": "Landing",
                "url": "/landing",
                "page_components": [
                    {"section_with_buttons": {
                        "title_text": "Plans",
                        "buttons": [
                            {"title": "Starter", "description": doc("For small teams")},
                            {"title": "Scale", "description": doc("For everyone else")}
                        ]
                    }},
                    {"section_with_html_code": {
                        "title": "Embed",
                        "description": doc("Paste this snippet")
                    }},
                    {"from_blog": {
                        "title_h2": "From the blog",
                        "featured_blogs": [{"uid": "b1", "_content_type_uid": "blog_post"}]
                    }}
                ]
            }),
        );

        let page = resolver(transport.clone(), false)
            .page("/landing")
            .await
            .unwrap()
            .unwrap()
            .to_value();

        for path in PAGE.rich_text {
            let values = stacksite_core::json_path::values_at(&page, path);
            assert!(!values.is_empty(), "nothing at {}", path);
            assert!(values.iter().all(|v| v.is_string()), "{} not converted", path);
        }
        let blocks = &page["page_components"];
        assert_eq!(
            blocks[0]["section_with_buttons"]["buttons"][1]["description"],
            "<p>For everyone else</p>"
        );
        assert_eq!(
            blocks[1]["section_with_html_code"]["description"],
            "<p>Paste this snippet</p>"
        );
        assert_eq!(blocks[2]["from_blog"]["featured_blogs"][0]["body"], "<p>new</p>");
        assert_eq!(
            blocks[0]["section_with_buttons"]["buttons"][0]["title"],
            "Starter"
        );
        assert_eq!(
            transport.queries()[0].references,
            vec!["page_components.from_blog.featured_blogs"]
        );
    }

    #[tokio::test]
    async fn preview_session_is_forwarded_to_queries() {
        let transport = fixtures();
        let resolver = resolver(transport.clone(), false)
            .with_preview(Some(PreviewSession::new("hash-9")));
        resolver.page("/").await.unwrap();

        let queries = transport.queries();
        assert_eq!(queries[0].preview, Some(PreviewSession::new("hash-9")));
        assert_eq!(queries[0].references.len(), PAGE.references.len());
    }

    #[tokio::test]
    async fn header_absent_is_none() {
        assert_eq!(resolver(fixtures(), false).header().await.unwrap(), None);
    }
}
