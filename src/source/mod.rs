//! Item sources: fetchable, resettable collections of items.
//!
//! An [`ItemSource`] is tied to one backend endpoint (autocomplete
//! suggestions, or full search results).  It never patches its items
//! incrementally: every completed fetch *resets* the whole collection and
//! notifies subscribers with a [`SourceEvent`].
//!
//! ## Ordering of responses
//!
//! Requests are not cancelled when a newer query supersedes them, so
//! answers can arrive out of order.  Every request carries a sequence
//! number, and by default a completion that is not for the latest issued
//! request is dropped.  `accept_stale` restores "last arrival wins".

pub mod item;
pub mod payload;

pub use item::Item;

use std::fmt;

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, trace, warn};

use crate::fetch::{FetchError, FetchRequest};
use crate::observer::{Observers, SubscriptionId};

/// Which collection a source holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Suggestions,
    Results,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Suggestions => "suggestions",
            SourceKind::Results => "results",
        })
    }
}

/// Per-source configuration.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub kind: SourceKind,
    /// Endpoint path on the backend (e.g. `/search/find`).
    pub endpoint: String,
    /// Apply completions in arrival order even when superseded.
    pub accept_stale: bool,
}

/// Notification emitted by an [`ItemSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// The item collection was replaced wholesale.
    Reset {
        kind: SourceKind,
        query: String,
        count: usize,
    },
    /// A fetch failed; the previous items are still in place.
    FetchFailed {
        kind: SourceKind,
        query: String,
        error: String,
    },
}

/// What [`ItemSource::complete`] did with a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Reset,
    Failed,
    Stale,
}

pub struct ItemSource {
    config: SourceConfig,
    items: Vec<Item>,
    requests: UnboundedSender<FetchRequest>,
    latest_issued: u64,
    last_reset: Option<DateTime<Local>>,
    observers: Observers<SourceEvent>,
}

impl ItemSource {
    /// Create an empty source that issues its requests on `requests`.
    pub fn new(config: SourceConfig, requests: UnboundedSender<FetchRequest>) -> Self {
        Self {
            config,
            items: Vec::new(),
            requests,
            latest_issued: 0,
            last_reset: None,
            observers: Observers::new(),
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.config.kind
    }

    /// The snapshot from the last applied reset.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn last_reset(&self) -> Option<DateTime<Local>> {
        self.last_reset
    }

    pub fn subscribe(&mut self) -> (SubscriptionId, std::sync::mpsc::Receiver<SourceEvent>) {
        self.observers.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Issue one fetch for `query`.
    ///
    /// A blank query is answered locally: the backend returns nothing for
    /// it, so the source resets to empty without a request.  The sequence
    /// number still advances so that older in-flight answers go stale.
    ///
    /// Returns the sequence number of the request, if one was sent.
    pub fn update_items(&mut self, query: &str) -> Option<u64> {
        self.latest_issued += 1;
        let seq = self.latest_issued;

        if query.trim().is_empty() {
            debug!(kind = %self.kind(), seq, "blank query, resetting locally");
            self.reset(query, Vec::new());
            return None;
        }

        let request = FetchRequest {
            kind: self.kind(),
            endpoint: self.config.endpoint.clone(),
            query: query.to_string(),
            seq,
        };
        debug!(kind = %self.kind(), seq, query, "issuing fetch");
        if self.requests.send(request).is_err() {
            self.fail(query, &FetchError::WorkerGone);
            return None;
        }
        Some(seq)
    }

    /// Apply the outcome of request `seq`.
    pub fn complete(
        &mut self,
        seq: u64,
        query: &str,
        outcome: Result<Vec<Item>, FetchError>,
    ) -> Completion {
        if seq != self.latest_issued && !self.config.accept_stale {
            trace!(
                kind = %self.kind(),
                seq,
                latest = self.latest_issued,
                "dropping superseded response"
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(items) => {
                self.reset(query, items);
                Completion::Reset
            }
            Err(e) => {
                self.fail(query, &e);
                Completion::Failed
            }
        }
    }

    fn reset(&mut self, query: &str, items: Vec<Item>) {
        self.items = items;
        self.last_reset = Some(Local::now());
        self.observers.emit(&SourceEvent::Reset {
            kind: self.kind(),
            query: query.to_string(),
            count: self.items.len(),
        });
    }

    fn fail(&mut self, query: &str, error: &FetchError) {
        warn!(kind = %self.kind(), query, %error, "keeping previous items");
        self.observers.emit(&SourceEvent::FetchFailed {
            kind: self.kind(),
            query: query.to_string(),
            error: error.to_string(),
        });
    }
}
