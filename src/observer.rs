//! Typed subscribe / unsubscribe for model events.
//!
//! Each subscriber gets its own [`mpsc`] receiver and drains it from the
//! event loop, the same way the main loop drains fetch completions.  A
//! subscriber whose receiver has been dropped is pruned on the next emit.

use std::sync::mpsc::{self, Receiver, Sender};

/// Handle returned by [`Observers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A list of subscribers to events of type `E`.
#[derive(Debug)]
pub struct Observers<E> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Sender<E>)>,
}

impl<E> Default for Observers<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }
}

impl<E: Clone> Observers<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> (SubscriptionId, Receiver<E>) {
        let (tx, rx) = mpsc::channel();
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, tx));
        (id, rx)
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver `event` to every live subscriber.
    pub fn emit(&mut self, event: &E) {
        self.subscribers.retain(|(_, tx)| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }
}
