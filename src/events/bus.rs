//! # Event bus for lifecycle events.
//!
//! [`Bus`] wraps [`tokio::sync::broadcast`] so every component can publish
//! without awaiting anyone: the dispatch loop, attempt workers, retry timers and
//! the public API all hold a clone.
//!
//! ```text
//! Publishers (many):                     Listener (one):
//!   Scheduler API ──┐
//!   Dispatcher    ──┼──────► Bus ───────► fan-out listener ────► SubscriberSet
//!   Workers       ──┤  (broadcast chan)     (spawned by the builder)
//!   Retry timers  ──┘
//! ```
//!
//! Callers may also [`Bus::subscribe`] directly (tests do) to observe the raw stream.
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - One ring buffer of `capacity` events is shared by all receivers.
//! - A receiver that falls behind gets `RecvError::Lagged(n)` and skips `n` events.
//! - A receiver only sees events sent after it subscribed.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable broadcast handle for [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus whose ring buffer holds `capacity` events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget publish.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
