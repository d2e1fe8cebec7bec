//! # SubscriberSet: one bounded lane per subscriber
//!
//! [`SubscriberSet`] hands each [`Event`] to every subscriber **without awaiting**
//! its processing.
//!
//! ## Guarantees
//! - `emit(&Event)` never waits for a subscriber.
//! - Each subscriber sees events in bus order.
//! - A panicking subscriber does not take down its worker or the others.
//!
//! ## Non-guarantees
//! - No ordering across different subscribers.
//! - No retry when a subscriber queue overflows (the event is dropped for it).
//!
//! Overflow and panics are reported on the bus as `SubscriberOverflow` /
//! `SubscriberPanicked`, except when the dropped event is itself a subscriber
//! event (that would feed back into the full queue).

use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::events::{Bus, Event, EventKind};
use crate::tasks::panic_message;

use super::Subscribe;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out to subscribers, each drained by its own worker task.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    drains: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one draining worker per subscriber.
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut lanes = Vec::with_capacity(subs.len());
        let mut drains = Vec::with_capacity(subs.len());

        for sub in subs {
            let name: &'static str = sub.name();
            let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            let worker_bus = bus.clone();

            let drain = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(payload) = std::panic::AssertUnwindSafe(fut).catch_unwind().await {
                        let info = panic_message(payload);
                        tracing::warn!(subscriber = name, panic = %info, "subscriber panicked");
                        if !is_subscriber_event(&ev) {
                            worker_bus.publish(Event::subscriber_panicked(name, info));
                        }
                    }
                }
            });

            lanes.push(Lane { name, tx });
            drains.push(drain);
        }

        Self { lanes, drains, bus }
    }

    /// Queues `event` for every subscriber; full or closed lanes drop it.
    pub fn emit(&self, event: &Event) {
        let shared = Arc::new(event.clone());
        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(subscriber = lane.name, reason, "subscriber dropped event");
            if !is_subscriber_event(event) {
                self.bus
                    .publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes all queues and waits for the workers to drain them.
    pub async fn shutdown(self) {
        let Self { lanes, drains, .. } = self;
        drop(lanes);
        for drain in drains {
            let _ = drain.await;
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

fn is_subscriber_event(ev: &Event) -> bool {
    matches!(
        ev.kind,
        EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
    )
}
