//! Transports that execute an [`EntryQuery`] against the CMS.
//!
//! [`HttpTransport`] talks to the real delivery API with [`reqwest`];
//! [`crate::memory::MemoryTransport`] answers from fixtures.

use crate::error::{DeliveryError, Result};
use crate::query::EntryQuery;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde_json::Value;
use stacksite_core::CmsSettings;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes entry queries and returns raw entry JSON.
///
/// Reference expansion happens on the transport side; rich-text conversion
/// does not.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Value>>;
}

/// Response body of the entries endpoint.
#[derive(Debug, Deserialize)]
struct EntriesResponse {
    #[serde(default)]
    entries: Vec<Value>,
}

/// HTTP transport for the ContentStack delivery and preview APIs.
pub struct HttpTransport {
    client: reqwest::Client,
    settings: Arc<CmsSettings>,
}

impl HttpTransport {
    /// Create a transport with stack credentials as default headers.
    pub fn new(settings: Arc<CmsSettings>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        insert_header(&mut headers, "api_key", &settings.api_key)?;
        insert_header(&mut headers, "access_token", &settings.delivery_token)?;
        if let Some(branch) = &settings.branch {
            insert_header(&mut headers, "branch", branch)?;
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, settings })
    }

    /// Entries endpoint for a query, on the preview host when the query
    /// carries a live-preview session and a preview token is configured.
    fn entries_url(&self, query: &EntryQuery) -> String {
        let base = if self.uses_preview(query) {
            self.settings.preview_base_url()
        } else {
            self.settings.delivery_base_url()
        };
        format!("{}/v3/content_types/{}/entries", base, query.content_type)
    }

    fn uses_preview(&self, query: &EntryQuery) -> bool {
        query.preview.is_some() && self.settings.preview_token.is_some()
    }

    fn query_params(&self, query: &EntryQuery) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("environment", self.settings.environment.clone()),
            ("locale", self.settings.locale.clone()),
        ];
        for path in &query.references {
            params.push(("include[]", path.clone()));
        }
        if let Some(filter) = query.filter_json() {
            params.push(("query", filter));
        }
        params
    }

    /// Ensure the response has a success status code, or turn it into a
    /// [`DeliveryError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DeliveryError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Value>> {
        let url = self.entries_url(query);
        let mut request = self.client.get(&url).query(&self.query_params(query));

        match (&query.preview, &self.settings.preview_token) {
            (Some(session), Some(token)) => {
                request = request
                    .header("preview_token", token)
                    .header("live_preview", &session.hash);
            }
            (Some(_), None) => {
                tracing::warn!(
                    content_type = %query.content_type,
                    "Live preview requested without a preview token, serving published content"
                );
            }
            _ => {}
        }

        tracing::debug!(%url, content_type = %query.content_type, "Fetching entries");
        let response = Self::ensure_success(request.send().await?).await?;
        let body: EntriesResponse = response.json().await?;
        Ok(body.entries)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &'static str, value: &str) -> Result<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| DeliveryError::Config(format!("invalid characters in '{}' header", name)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::PreviewSession;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_for(server: &MockServer, extra: &[(&str, &str)]) -> Arc<CmsSettings> {
        let mut vars: HashMap<String, String> = [
            ("CONTENTSTACK_API_KEY", "X"),
            ("CONTENTSTACK_DELIVERY_TOKEN", "delivery"),
            ("CONTENTSTACK_ENVIRONMENT", "production"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        vars.insert("CONTENTSTACK_API_HOST".to_string(), server.uri());
        vars.insert("CONTENTSTACK_PREVIEW_HOST".to_string(), server.uri());
        for (k, v) in extra {
            vars.insert(k.to_string(), v.to_string());
        }
        Arc::new(CmsSettings::from_vars(&vars).unwrap())
    }

    #[tokio::test]
    async fn sends_credentials_includes_and_filter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/content_types/blog_post/entries"))
            .and(header("api_key", "X"))
            .and(header("access_token", "delivery"))
            .and(query_param("environment", "production"))
            .and(query_param("locale", "en-us"))
            .and(query_param("include[]", "author"))
            .and(query_param("include[]", "related_post"))
            .and(query_param("query", r#"{"url":"/blog/hello"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [{"uid": "p1", "title": "Hello"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(settings_for(&server, &[])).unwrap();
        let query = EntryQuery::new("blog_post")
            .references(&["author", "related_post"])
            .where_eq("url", "/blog/hello");

        let entries = transport.get_entries(&query).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["uid"], "p1");
    }

    #[tokio::test]
    async fn sends_branch_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("branch", "develop"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
            .expect(1)
            .mount(&server)
            .await;

        let settings = settings_for(&server, &[("CONTENTSTACK_BRANCH", "develop")]);
        let transport = HttpTransport::new(settings).unwrap();
        let entries = transport.get_entries(&EntryQuery::new("page")).await.unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn preview_session_sends_preview_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("preview_token", "preview"))
            .and(header("live_preview", "hash-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
            .expect(1)
            .mount(&server)
            .await;

        let settings = settings_for(&server, &[("CONTENTSTACK_PREVIEW_TOKEN", "preview")]);
        let transport = HttpTransport::new(settings).unwrap();
        let query = EntryQuery::new("page").preview(Some(PreviewSession::new("hash-1")));
        transport.get_entries(&query).await.unwrap();
    }

    #[tokio::test]
    async fn server_error_is_transient_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(settings_for(&server, &[])).unwrap();
        let err = transport
            .get_entries(&EntryQuery::new("page"))
            .await
            .unwrap_err();
        assert_matches!(&err, DeliveryError::Api { status: 503, body } if body == "maintenance");
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn unreachable_host_is_request_error() {
        let server = MockServer::start().await;
        let settings = settings_for(&server, &[]);
        drop(server);

        let transport = HttpTransport::new(settings).unwrap();
        let err = transport
            .get_entries(&EntryQuery::new("page"))
            .await
            .unwrap_err();
        assert_matches!(err, DeliveryError::Request(_));
    }

    #[test]
    fn rejects_header_unsafe_credentials() {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("CONTENTSTACK_API_KEY".into(), "bad\nkey".into());
        vars.insert("CONTENTSTACK_DELIVERY_TOKEN".into(), "t".into());
        vars.insert("CONTENTSTACK_ENVIRONMENT".into(), "e".into());
        let settings = Arc::new(CmsSettings::from_vars(&vars).unwrap());
        assert!(matches!(
            HttpTransport::new(settings),
            Err(DeliveryError::Config(_))
        ));
    }
}
