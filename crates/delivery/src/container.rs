//! Page container: the loading state of one routed page.
//!
//! A container owns the fetch for its page and publishes every state change
//! on a `watch` channel. Refetches keep the previous entry visible until the
//! new one arrives. Every fetch takes a ticket; completions that arrive after
//! a newer one has been applied are dropped.

use crate::error::{DeliveryError, Result};
use crate::live::{LiveUpdates, Subscription};
use crate::query::PreviewSession;
use futures::FutureExt;
use futures::future::BoxFuture;
use stacksite_core::RefetchFailurePolicy;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum PageState<T> {
    Loading,
    Ready(T),
    /// A refetch is in flight; the previous entry is still shown.
    Refetching(T),
    NotFound,
    Failed(String),
}

impl<T> PageState<T> {
    /// The entry to display, if any.
    pub fn entry(&self) -> Option<&T> {
        match self {
            PageState::Ready(entry) | PageState::Refetching(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PageState::Loading)
    }
}

/// Sequence number of one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

#[derive(Debug, Default)]
struct Sequence {
    issued: u64,
    applied: u64,
}

type Fetcher<T> =
    Arc<dyn Fn(Option<PreviewSession>) -> BoxFuture<'static, Result<Option<T>>> + Send + Sync>;

pub struct PageContainer<T> {
    fetcher: Fetcher<T>,
    policy: RefetchFailurePolicy,
    state: watch::Sender<PageState<T>>,
    sequence: Mutex<Sequence>,
}

impl<T> PageContainer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new<F, Fut>(policy: RefetchFailurePolicy, fetch: F) -> Self
    where
        F: Fn(Option<PreviewSession>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<T>>> + Send + 'static,
    {
        let (state, _) = watch::channel(PageState::Loading);
        Self {
            fetcher: Arc::new(move |preview| fetch(preview).boxed()),
            policy,
            state,
            sequence: Mutex::new(Sequence::default()),
        }
    }

    pub fn state(&self) -> PageState<T> {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    pub fn watch(&self) -> watch::Receiver<PageState<T>> {
        self.state.subscribe()
    }

    /// Initial load of published content.
    pub async fn load(&self) -> PageState<T> {
        self.refetch(None).await
    }

    /// Fetch again, optionally from a preview session, and apply the result.
    pub async fn refetch(&self, preview: Option<PreviewSession>) -> PageState<T> {
        let ticket = self.begin();
        let result = (self.fetcher)(preview).await;
        self.complete(ticket, result);
        self.state()
    }

    /// Issue a ticket for a new fetch. A ready page moves to `Refetching`.
    pub fn begin(&self) -> FetchTicket {
        let mut sequence = self.lock();
        sequence.issued += 1;
        self.state.send_if_modified(|state| match state {
            PageState::Ready(entry) => {
                let stale = entry.clone();
                *state = PageState::Refetching(stale);
                true
            }
            _ => false,
        });
        FetchTicket(sequence.issued)
    }

    /// Apply the outcome of the fetch holding `ticket`.
    ///
    /// Returns `false` when a newer fetch was already applied and this
    /// result was discarded.
    pub fn complete(&self, ticket: FetchTicket, result: Result<Option<T>>) -> bool {
        let mut sequence = self.lock();
        if ticket.0 <= sequence.applied {
            tracing::debug!(
                ticket = ticket.0,
                applied = sequence.applied,
                "Discarding superseded fetch result"
            );
            return false;
        }
        sequence.applied = ticket.0;
        let newer_pending = sequence.issued > ticket.0;

        let policy = self.policy;
        self.state.send_modify(|state| {
            let stale = state.entry().cloned();
            *state = match result {
                Ok(Some(entry)) if newer_pending => PageState::Refetching(entry),
                Ok(Some(entry)) => PageState::Ready(entry),
                Ok(None) => PageState::NotFound,
                Err(err) => match (stale, policy) {
                    (Some(entry), RefetchFailurePolicy::KeepStale) => {
                        tracing::warn!(error = %err, "Refetch failed, keeping previous content");
                        if newer_pending {
                            PageState::Refetching(entry)
                        } else {
                            PageState::Ready(entry)
                        }
                    }
                    _ => {
                        tracing::error!(error = %err, "Page fetch failed");
                        PageState::Failed(err.to_string())
                    }
                },
            };
        });
        true
    }

    /// Refetch whenever the live-update bus reports a change.
    ///
    /// The subscription holds only a weak reference to the container; drop
    /// it to stop watching.
    pub fn watch_live(self: &Arc<Self>, bus: &Arc<LiveUpdates>) -> Subscription {
        let container = Arc::downgrade(self);
        bus.subscribe(move |change| {
            let Some(container) = container.upgrade() else {
                return;
            };
            let ticket = container.begin();
            let preview = change.preview_session();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        let result = (container.fetcher)(preview).await;
                        container.complete(ticket, result);
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        "Live change received outside the async runtime, refetch skipped"
                    );
                    container.complete(
                        ticket,
                        Err(DeliveryError::Unavailable("no async runtime".to_string())),
                    );
                }
            }
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Sequence> {
        self.sequence.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
