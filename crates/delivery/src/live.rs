//! Process-wide registry of live-update callbacks.
//!
//! The CMS editor reports every saved change; subscribers (page containers,
//! the browser reload stream) react by refetching. One [`LiveUpdates`] value
//! is built at startup and shared by `Arc`.

use crate::query::PreviewSession;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Notification that an entry changed in the CMS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryChange {
    pub content_type_uid: String,
    pub entry_uid: String,
    #[serde(default)]
    pub locale: String,
    /// Live-preview session hash, when the change comes from the editor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl EntryChange {
    pub fn preview_session(&self) -> Option<PreviewSession> {
        self.hash.as_deref().map(PreviewSession::new)
    }
}

type Callback = Arc<dyn Fn(&EntryChange) + Send + Sync>;

pub struct LiveUpdates {
    enabled: bool,
    next_id: AtomicU64,
    callbacks: Mutex<HashMap<u64, Callback>>,
}

impl LiveUpdates {
    pub fn new(enabled: bool) -> Arc<Self> {
        Arc::new(Self {
            enabled,
            next_id: AtomicU64::new(1),
            callbacks: Mutex::new(HashMap::new()),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register a callback for every future change.
    ///
    /// With live preview disabled the returned subscription is inert and the
    /// callback is never called.
    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&EntryChange) + Send + Sync + 'static,
    {
        if !self.enabled {
            return Subscription::inert();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, Arc::new(callback));
        tracing::debug!(id, "Live update subscriber added");

        Subscription {
            bus: Arc::downgrade(self),
            id: Some(id),
        }
    }

    /// Deliver a change to every current subscriber, returning how many
    /// were called.
    pub fn publish(&self, change: &EntryChange) -> usize {
        let callbacks: Vec<Callback> = self.lock().values().cloned().collect();
        tracing::debug!(
            content_type = %change.content_type_uid,
            entry_uid = %change.entry_uid,
            subscribers = callbacks.len(),
            "Publishing entry change"
        );
        for callback in &callbacks {
            callback(change);
        }
        callbacks.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: u64) {
        if self.lock().remove(&id).is_some() {
            tracing::debug!(id, "Live update subscriber removed");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Callback>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle for one registered callback. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<LiveUpdates>,
    id: Option<u64>,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            bus: Weak::new(),
            id: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.id.is_some() && self.bus.strong_count() > 0
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let (Some(id), Some(bus)) = (self.id.take(), self.bus.upgrade()) {
            bus.remove(id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn change() -> EntryChange {
        EntryChange {
            content_type_uid: "page".to_string(),
            entry_uid: "home".to_string(),
            locale: "en-us".to_string(),
            hash: Some("h1".to_string()),
        }
    }

    fn counter(bus: &Arc<LiveUpdates>) -> (Arc<AtomicUsize>, Subscription) {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let subscription = bus.subscribe(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        (count, subscription)
    }

    #[test]
    fn each_subscriber_called_once_per_change() {
        let bus = LiveUpdates::new(true);
        let (a, _sa) = counter(&bus);
        let (b, _sb) = counter(&bus);

        assert_eq!(bus.publish(&change()), 2);
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = LiveUpdates::new(true);
        let (count, subscription) = counter(&bus);
        bus.publish(&change());
        subscription.unsubscribe();
        bus.publish(&change());

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let bus = LiveUpdates::new(true);
        let (count, subscription) = counter(&bus);
        drop(subscription);
        assert_eq!(bus.publish(&change()), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn disabled_bus_ignores_subscribers() {
        let bus = LiveUpdates::new(false);
        let (count, subscription) = counter(&bus);
        assert!(!subscription.is_active());
        bus.publish(&change());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn callback_may_subscribe_without_deadlock() {
        let bus = LiveUpdates::new(true);
        let inner = Arc::new(Mutex::new(Vec::new()));
        let bus_ref = bus.clone();
        let holder = inner.clone();
        let _outer = bus.subscribe(move |_| {
            let sub = bus_ref.subscribe(|_| {});
            holder.lock().unwrap().push(sub);
        });

        bus.publish(&change());
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn change_payload_parses_without_hash() {
        let change: EntryChange = serde_json::from_str(
            r#"{"content_type_uid": "page", "entry_uid": "home", "locale": "en-us"}"#,
        )
        .unwrap();
        assert_eq!(change.preview_session(), None);
    }
}
