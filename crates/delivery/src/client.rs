//! Content Client: typed access to entries of one content type.

use crate::error::{DeliveryError, Result};
use crate::query::EntryQuery;
use crate::retry::{RetryConfig, with_retry};
use crate::transport::{DeliveryTransport, HttpTransport};
use serde_json::Value;
use stacksite_core::rich_text::{self, RenderOptions};
use stacksite_core::{CmsSettings, Entry, json_path};
use std::sync::Arc;

/// Client for the delivery API shared by every resolver.
///
/// Cheap to clone; the transport and rich-text options are shared.
#[derive(Clone)]
pub struct ContentClient {
    transport: Arc<dyn DeliveryTransport>,
    retry: RetryConfig,
    rich_text: Arc<RenderOptions>,
}

impl ContentClient {
    pub fn new(transport: Arc<dyn DeliveryTransport>) -> Self {
        Self {
            transport,
            retry: RetryConfig::default(),
            rich_text: Arc::new(RenderOptions::default()),
        }
    }

    /// HTTP client configured from stack settings.
    pub fn from_settings(settings: Arc<CmsSettings>) -> Result<Self> {
        let retry = RetryConfig::with_max_retries(settings.max_retries);
        let transport = HttpTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport)).with_retry(retry))
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rich_text_options(mut self, options: RenderOptions) -> Self {
        self.rich_text = Arc::new(options);
        self
    }

    /// All entries of a content type with references expanded and rich
    /// text converted.
    pub async fn fetch_by_type(
        &self,
        content_type: &str,
        references: &[&str],
        rich_text: &[&str],
    ) -> Result<Vec<Entry>> {
        let query = EntryQuery::new(content_type)
            .references(references)
            .rich_text(rich_text);
        self.fetch(&query).await
    }

    /// The first entry whose `url` field equals `url`, or `None`.
    pub async fn fetch_by_url(
        &self,
        content_type: &str,
        url: &str,
        references: &[&str],
        rich_text: &[&str],
    ) -> Result<Option<Entry>> {
        let query = EntryQuery::new(content_type)
            .references(references)
            .rich_text(rich_text)
            .where_eq("url", url);
        self.fetch_first(&query).await
    }

    /// Run a query and return the first match, or `None`.
    pub async fn fetch_first(&self, query: &EntryQuery) -> Result<Option<Entry>> {
        let entry = self.fetch(query).await?.into_iter().next();
        if entry.is_none() {
            tracing::debug!(
                content_type = %query.content_type,
                filter = ?query.filter,
                "No entry matched"
            );
        }
        Ok(entry)
    }

    /// Run a query and post-process every entry.
    pub async fn fetch(&self, query: &EntryQuery) -> Result<Vec<Entry>> {
        let operation = format!("fetch {}", query.content_type);
        let raw = with_retry(&self.retry, &operation, || self.transport.get_entries(query)).await?;

        raw.into_iter()
            .map(|mut value| {
                self.convert_rich_text(&mut value, &query.rich_text);
                Entry::from_value(value).map_err(|e| {
                    DeliveryError::Decode(format!("{} entry: {}", query.content_type, e))
                })
            })
            .collect()
    }

    fn convert_rich_text(&self, value: &mut Value, paths: &[String]) {
        for path in paths {
            json_path::for_each_mut(value, path, |field| {
                rich_text::convert_in_place(field, &self.rich_text);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTransport;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    fn doc(text: &str) -> Value {
        json!({"type": "doc", "children": [{"type": "p", "children": [{"text": text}]}]})
    }

    fn client(transport: Arc<MemoryTransport>) -> ContentClient {
        ContentClient::new(transport).with_retry(RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(1),
            multiplier: 1.0,
        })
    }

    #[tokio::test]
    async fn converts_declared_rich_text_paths() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert(
            "footer",
            json!({
                "uid": "f1",
                "locale": "en-us",
                "copyright": doc("(c) Acme"),
                "notes": doc("raw")
            }),
        );

        let entries = client(transport)
            .fetch_by_type("footer", &[], &["copyright"])
            .await
            .unwrap();

        assert_eq!(entries[0].get("copyright"), Some(&json!("<p>(c) Acme</p>")));
        assert!(entries[0].get("notes").unwrap().is_object());
    }

    #[tokio::test]
    async fn fetch_by_url_expands_references() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert("author", json!({"uid": "a1", "title": "Ada"}));
        transport.insert(
            "blog_post",
            json!({
                "uid": "p1",
                "url": "/blog/one",
                "author": [{"uid": "a1", "_content_type_uid": "author"}],
                "body": doc("hello")
            }),
        );

        let entry = client(transport)
            .fetch_by_url("blog_post", "/blog/one", &["author"], &["body"])
            .await
            .unwrap()
            .unwrap();

        assert_eq!(entry.get("author").unwrap()[0]["title"], "Ada");
        assert_eq!(entry.get("body"), Some(&json!("<p>hello</p>")));
    }

    #[tokio::test]
    async fn fetch_by_url_not_found_is_none() {
        let transport = Arc::new(MemoryTransport::new());
        let result = client(transport)
            .fetch_by_url("page", "/missing", &[], &[])
            .await;
        assert_matches!(result, Ok(None));
    }

    #[tokio::test]
    async fn transport_failure_is_distinct_from_not_found() {
        let transport = Arc::new(MemoryTransport::new());
        transport.fail_next(10);
        let result = client(transport.clone())
            .fetch_by_url("page", "/about", &[], &[])
            .await;
        assert_matches!(result, Err(DeliveryError::Unavailable(_)));
        assert_eq!(transport.call_count(), 3);
    }

    #[tokio::test]
    async fn recovers_after_transient_failure() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert("page", json!({"uid": "p1", "url": "/"}));
        transport.fail_next(1);

        let entry = client(transport.clone())
            .fetch_by_url("page", "/", &[], &[])
            .await
            .unwrap();
        assert!(entry.is_some());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn entry_without_uid_is_decode_error() {
        let transport = Arc::new(MemoryTransport::new());
        transport.insert("page", json!({"title": "broken"}));
        let result = client(transport).fetch_by_type("page", &[], &[]).await;
        assert_matches!(result, Err(DeliveryError::Decode(_)));
    }
}
