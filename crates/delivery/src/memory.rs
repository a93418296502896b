//! In-memory transport answering queries from fixture entries.
//!
//! Behaves like the delivery API for the subset the site uses: equality
//! filters, reference expansion for the requested `include[]` paths, and
//! bare `{uid, _content_type_uid}` stubs for references left unexpanded.
//! Failures can be injected to exercise retry and error paths.

use crate::error::{DeliveryError, Result};
use crate::query::EntryQuery;
use crate::transport::DeliveryTransport;
use async_trait::async_trait;
use serde_json::{Value, json};
use stacksite_core::json_path;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

#[derive(Default)]
pub struct MemoryTransport {
    entries: Mutex<HashMap<String, Vec<Value>>>,
    queued_failures: AtomicU32,
    calls: AtomicUsize,
    queries: Mutex<Vec<EntryQuery>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to a content type.
    pub fn insert(&self, content_type: &str, entry: Value) {
        lock(&self.entries)
            .entry(content_type.to_string())
            .or_default()
            .push(entry);
    }

    /// Replace an entry with the same uid, or add it.
    pub fn upsert(&self, content_type: &str, entry: Value) {
        let mut entries = lock(&self.entries);
        let list = entries.entry(content_type.to_string()).or_default();
        let uid = entry.get("uid").cloned();
        match list.iter_mut().find(|e| e.get("uid") == uid.as_ref()) {
            Some(existing) => *existing = entry,
            None => list.push(entry),
        }
    }

    /// Remove every entry of a content type whose field equals `value`.
    pub fn remove_where(&self, content_type: &str, field: &str, value: &str) {
        if let Some(list) = lock(&self.entries).get_mut(content_type) {
            list.retain(|e| e.get(field).and_then(Value::as_str) != Some(value));
        }
    }

    /// Make the next `count` queries fail with a transient error.
    pub fn fail_next(&self, count: u32) {
        self.queued_failures.store(count, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<EntryQuery> {
        lock(&self.queries).clone()
    }

    fn find(&self, content_type: &str, uid: &str) -> Option<Value> {
        lock(&self.entries)
            .get(content_type)?
            .iter()
            .find(|e| e.get("uid").and_then(Value::as_str) == Some(uid))
            .cloned()
    }

    fn expand(&self, value: &mut Value) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.expand(item);
                }
            }
            Value::Object(_) => {
                let content_type = value.get("_content_type_uid").and_then(Value::as_str);
                let uid = value.get("uid").and_then(Value::as_str);
                if let (Some(content_type), Some(uid)) = (content_type, uid)
                    && let Some(mut found) = self.find(content_type, uid)
                {
                    if let Value::Object(map) = &mut found {
                        map.insert("_content_type_uid".to_string(), json!(content_type));
                    }
                    *value = found;
                }
            }
            _ => {}
        }
    }
}

#[async_trait]
impl DeliveryTransport for MemoryTransport {
    async fn get_entries(&self, query: &EntryQuery) -> Result<Vec<Value>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.queries).push(query.clone());

        let pending = self.queued_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.queued_failures.store(pending - 1, Ordering::SeqCst);
            return Err(DeliveryError::Unavailable("injected failure".to_string()));
        }

        let mut entries: Vec<Value> = lock(&self.entries)
            .get(&query.content_type)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|entry| match &query.filter {
                Some((field, value)) => {
                    entry.get(field).and_then(Value::as_str) == Some(value.as_str())
                }
                None => true,
            })
            .collect();

        for entry in &mut entries {
            for path in &query.references {
                json_path::for_each_mut(entry, path, |v| self.expand(v));
            }
        }

        Ok(entries)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> MemoryTransport {
        let transport = MemoryTransport::new();
        transport.insert("author", json!({"uid": "a1", "title": "Ada"}));
        transport.insert(
            "blog_post",
            json!({
                "uid": "p1",
                "url": "/blog/one",
                "author": [{"uid": "a1", "_content_type_uid": "author"}]
            }),
        );
        transport
    }

    #[tokio::test]
    async fn filters_and_expands_declared_references() {
        let transport = transport();
        let query = EntryQuery::new("blog_post")
            .references(&["author"])
            .where_eq("url", "/blog/one");

        let entries = transport.get_entries(&query).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["author"][0]["title"], "Ada");
        assert_eq!(entries[0]["author"][0]["_content_type_uid"], "author");
    }

    #[tokio::test]
    async fn undeclared_references_stay_bare() {
        let transport = transport();
        let entries = transport
            .get_entries(&EntryQuery::new("blog_post"))
            .await
            .unwrap();
        assert!(entries[0]["author"][0].get("title").is_none());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let transport = transport();
        transport.fail_next(1);
        assert!(transport.get_entries(&EntryQuery::new("author")).await.is_err());
        assert!(transport.get_entries(&EntryQuery::new("author")).await.is_ok());
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn upsert_replaces_by_uid() {
        let transport = transport();
        transport.upsert("author", json!({"uid": "a1", "title": "Grace"}));
        let entries = transport.get_entries(&EntryQuery::new("author")).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["title"], "Grace");
    }
}
