//! The query model and its debounce scheduler.
//!
//! [`QueryModel`] owns the current query text and the item sources it fans
//! out to.  Edits arrive through [`QueryModel::set_query`]; an edit that
//! actually changes the text (re)arms a single deadline, and when the event
//! loop calls [`QueryModel::poll_timer`] after that deadline every source is
//! asked to update for the query *as it is then*.  A burst of keystrokes
//! inside the quiet window therefore collapses into one fan-out.
//!
//! Time is passed in by the caller rather than read from a clock, so the
//! scheduler is deterministic under test.

use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::fetch::FetchMsg;
use crate::observer::{Observers, SubscriptionId};
use crate::source::{Completion, ItemSource, SourceKind};

/// Default quiet window between the last edit and the fan-out.
pub const DEFAULT_MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(200);

/// Where a query change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrigin {
    /// Typed into the search box.
    Local,
    /// A suggestion was chosen.
    Selection,
    /// Supplied on the command line.
    Initial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    Changed { query: String, origin: QueryOrigin },
}

pub struct QueryModel {
    query: String,
    /// Deadline of the one outstanding fan-out, if any.
    pending: Option<Instant>,
    min_update_interval: Duration,
    sources: Vec<ItemSource>,
    observers: Observers<QueryEvent>,
}

impl QueryModel {
    pub fn new(sources: Vec<ItemSource>, min_update_interval: Duration) -> Self {
        Self {
            query: String::new(),
            pending: None,
            min_update_interval,
            sources,
            observers: Observers::new(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn source(&self, kind: SourceKind) -> Option<&ItemSource> {
        self.sources.iter().find(|s| s.kind() == kind)
    }

    pub fn source_mut(&mut self, kind: SourceKind) -> Option<&mut ItemSource> {
        self.sources.iter_mut().find(|s| s.kind() == kind)
    }

    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<QueryEvent>) {
        self.observers.subscribe()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    /// Replace the query and restart the quiet window.
    ///
    /// Setting the value already held is a no-op: the pending deadline is
    /// neither moved nor re-armed, and no event is emitted.  Returns whether
    /// the query changed.
    pub fn set_query(&mut self, text: &str, origin: QueryOrigin, now: Instant) -> bool {
        if text == self.query {
            return false;
        }
        self.query = text.to_string();
        self.pending = Some(now + self.min_update_interval);
        debug!(query = %self.query, ?origin, "query changed, fan-out rescheduled");

        self.observers.emit(&QueryEvent::Changed {
            query: self.query.clone(),
            origin,
        });
        true
    }

    /// Time left before the pending fan-out is due.
    pub fn time_until_fire(&self, now: Instant) -> Option<Duration> {
        self.pending.map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Run the fan-out if its deadline has passed.  Returns whether it ran.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                self.update_suggestions();
                true
            }
            _ => false,
        }
    }

    /// Cancel any pending deadline and fan out right away.
    pub fn flush(&mut self) {
        self.pending = None;
        self.update_suggestions();
    }

    /// Route a fetch completion to the source that issued it.
    pub fn deliver(&mut self, msg: FetchMsg) -> Option<Completion> {
        let source = self.source_mut(msg.kind)?;
        Some(source.complete(msg.seq, &msg.query, msg.outcome))
    }

    fn update_suggestions(&mut self) {
        debug!(query = %self.query, sources = self.sources.len(), "fan-out");
        for source in &mut self.sources {
            source.update_items(&self.query);
        }
    }
}
