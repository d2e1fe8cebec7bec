//! # Dispatch loop.
//!
//! One tokio task that turns queue entries into attempts on a bounded worker pool.
//!
//! ```text
//! loop {
//!   acquire slot (Semaphore, max_workers) ──┐
//!   pop entry (≤ poll_interval) ────────────┤ shutdown token aborts either wait
//!   registry.claim(entry)                   │
//!     ├─ Dispatch(attempt) → JoinSet::spawn(worker holding the slot)
//!     ├─ Blocked           → timer: sleep(dependency_recheck) → requeue_blocked
//!     └─ Skipped           → drop entry, release slot
//! }
//! drain workers within grace ──► AllStoppedWithin | GraceExceeded
//! ```
//!
//! ## Rules
//! - The loop never awaits an attempt; workers do, and route the outcome to the registry.
//! - Retry and re-check timers live off the loop. Once shutdown is requested they
//!   re-enqueue immediately, so a stopped scheduler never strands a task in RETRYING.
//! - After grace, remaining attempts are aborted and recorded as failed attempts
//!   (retried on the next `start()` if budget remains).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::config::{Config, DependencyPolicy};
use crate::error::{RuntimeError, TaskError};
use crate::events::{Bus, Event, EventKind};

use super::queue::QueueEntry;
use super::registry::{Claim, Registry, RetryPlan};
use super::runner::{self, Attempt};

pub(crate) struct Dispatcher {
    registry: Arc<Registry>,
    bus: Bus,
    slots: Arc<Semaphore>,
    poll: Duration,
    recheck: Duration,
    grace: Duration,
    policy: DependencyPolicy,
}

impl Dispatcher {
    pub fn new(cfg: &Config, registry: Arc<Registry>, bus: Bus, slots: Arc<Semaphore>) -> Self {
        Self {
            registry,
            bus,
            slots,
            poll: cfg.poll_interval,
            recheck: cfg.dependency_recheck,
            grace: cfg.grace,
            policy: cfg.dependency_policy,
        }
    }

    /// Runs until `token` is cancelled, then drains in-flight attempts.
    pub async fn run(self, token: CancellationToken) -> Result<(), RuntimeError> {
        let mut workers = JoinSet::new();

        loop {
            while workers.try_join_next().is_some() {}

            let permit = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                p = Arc::clone(&self.slots).acquire_owned() => match p {
                    Ok(p) => p,
                    Err(_closed) => break,
                },
            };

            let entry = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                e = self.registry.queue().pop(self.poll) => e,
            };
            let Some(entry) = entry else {
                continue;
            };

            match self.registry.claim(entry, self.policy, self.recheck).await {
                Claim::Dispatch(attempt) => {
                    workers.spawn(work(
                        Arc::clone(&self.registry),
                        self.bus.clone(),
                        attempt,
                        permit,
                        token.clone(),
                    ));
                }
                Claim::Blocked => self.recheck_later(entry, &token),
                Claim::Skipped => {}
            }
        }

        self.drain(&mut workers).await
    }

    fn recheck_later(&self, entry: QueueEntry, shutdown: &CancellationToken) {
        let registry = Arc::clone(&self.registry);
        let shutdown = shutdown.clone();
        let pause = self.recheck;
        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(pause) => {}
                _ = shutdown.cancelled() => {}
            }
            registry.requeue_blocked(entry).await;
        });
    }

    /// Waits for in-flight attempts within the grace period.
    ///
    /// Publishes [`EventKind::AllStoppedWithin`] on success, or aborts the rest,
    /// publishes [`EventKind::GraceExceeded`] and returns
    /// [`RuntimeError::GraceExceeded`] with the stuck task names.
    async fn drain(&self, workers: &mut JoinSet<()>) -> Result<(), RuntimeError> {
        let grace = self.grace;
        let done = async { while workers.join_next().await.is_some() {} };
        let timed = time::timeout(grace, done).await;

        if timed.is_ok() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        }

        workers.abort_all();
        while workers.join_next().await.is_some() {}

        let mut stuck = Vec::new();
        for (id, attempt, name) in self.registry.running().await {
            let aborted = Err(TaskError::fail("attempt aborted: shutdown grace exceeded"));
            if let Some(plan) = self.registry.complete(id, attempt, aborted, grace).await {
                self.registry.requeue_retry(plan.id).await;
            }
            stuck.push(name);
        }

        self.bus
            .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")));
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }
}

/// Worker body: one attempt on one slot, outcome routed to the registry.
async fn work(
    registry: Arc<Registry>,
    bus: Bus,
    attempt: Attempt,
    permit: OwnedSemaphorePermit,
    shutdown: CancellationToken,
) {
    let started = Instant::now();
    let outcome = runner::run_attempt(&attempt, &bus).await;
    let plan = registry
        .complete(attempt.id, attempt.number, outcome, started.elapsed())
        .await;
    drop(permit);

    if let Some(plan) = plan {
        retry_later(registry, plan, shutdown);
    }
}

fn retry_later(registry: Arc<Registry>, plan: RetryPlan, shutdown: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = time::sleep(plan.delay) => {}
            _ = shutdown.cancelled() => {}
        }
        registry.requeue_retry(plan.id).await;
    });
}
