use std::sync::Arc;

use tokio::sync::{Semaphore, broadcast};
use tokio_util::sync::CancellationToken;

use super::{registry::Registry, scheduler::Scheduler};
use crate::{
    clock::{Clock, SystemClock},
    config::Config,
    events::{Bus, Event},
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Scheduler`] with optional subscribers and clock.
pub struct SchedulerBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    clock: Arc<dyn Clock>,
}

impl SchedulerBuilder {
    /// Creates a builder with the given configuration and the system clock.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker and bounded queue, so a slow one
    /// never holds up dispatch.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Adds one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Replaces the wall clock used for task timestamps.
    pub fn with_clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Builds the scheduler. The dispatch loop is not started.
    ///
    /// With subscribers configured this must run inside a tokio runtime: their
    /// workers and the bus listener are spawned here.
    pub fn build(self) -> Arc<Scheduler> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let registry = Arc::new(Registry::new(bus.clone(), self.clock));
        let slots = Arc::new(Semaphore::new(self.cfg.worker_slots()));

        let listener = CancellationToken::new();
        if !self.subscribers.is_empty() {
            let set = SubscriberSet::new(self.subscribers, bus.clone());
            spawn_listener(bus.subscribe(), set, listener.clone());
        }

        Arc::new(Scheduler::new_internal(
            self.cfg, bus, registry, slots, listener,
        ))
    }
}

/// Forwards bus events to the subscriber set until `stop` fires.
fn spawn_listener(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, stop: CancellationToken) {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                msg = rx.recv() => match msg {
                    Ok(ev) => set.emit(&ev),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "subscriber listener lagged behind the bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        set.shutdown().await;
    });
}
