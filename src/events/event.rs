//! # Lifecycle events emitted by the scheduler.
//!
//! [`EventKind`] falls into three groups:
//! - **Task events**: submission, dispatch, attempt outcome, retry, terminal state
//! - **Runtime events**: dispatch loop start, shutdown, grace handling
//! - **Subscriber events**: overflow and panic inside subscriber workers
//!
//! ## Ordering
//! `seq` comes from one process-wide counter. Events for one task are published
//! under the registry lock, so their `seq` order is their causal order; merge
//! streams from several subscribers by sorting on it.
//!
//! ## Building an event
//! ```rust
//! use std::time::Duration;
//! use taskdeck::{Event, EventKind, TaskId};
//!
//! let id = TaskId::new();
//! let ev = Event::new(EventKind::RetryScheduled)
//!     .with_task(id, "click-start")
//!     .with_attempt(2)
//!     .with_delay(Duration::from_millis(500))
//!     .with_reason("image not found");
//!
//! assert_eq!(ev.task_id, Some(id));
//! assert_eq!(ev.delay_ms, Some(500));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::tasks::{Priority, TaskId};

/// Source of [`Event::seq`].
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// What happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked while handling an event.
    ///
    /// Sets: `task` (subscriber name), `reason` (panic message).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`.
    SubscriberOverflow,

    // === Runtime events ===
    /// Dispatch loop started.
    SchedulerStarted,

    /// `stop()` was called or an OS signal arrived.
    ShutdownRequested,

    /// All in-flight attempts finished within the grace period.
    AllStoppedWithin,

    /// Grace period exceeded; remaining attempts were aborted.
    ///
    /// Sets: `reason` (stuck task names).
    GraceExceeded,

    // === Task events ===
    /// Task accepted into the registry and ready queue.
    ///
    /// Sets: `task_id`, `task`, `priority`.
    TaskSubmitted,

    /// Dependency gate rejected the task; it will be re-queued.
    ///
    /// Sets: `task_id`, `task`, `delay_ms` (re-check pause).
    DependencyBlocked,

    /// An attempt is starting on a worker slot.
    ///
    /// Sets: `task_id`, `task`, `priority`, `attempt` (1-based), `executor`.
    TaskStarting,

    /// Attempt exceeded the task timeout (always followed by `AttemptFailed`).
    ///
    /// Sets: `task_id`, `task`, `attempt`, `timeout_ms`.
    TimeoutHit,

    /// Attempt failed (error, timeout or panic).
    ///
    /// Sets: `task_id`, `task`, `attempt`, `reason`.
    AttemptFailed,

    /// Next attempt scheduled after a failure.
    ///
    /// Sets: `task_id`, `task`, `attempt` (failed attempt), `delay_ms`, `reason`.
    RetryScheduled,

    /// Task reached `COMPLETED`.
    ///
    /// Sets: `task_id`, `task`, `attempt`.
    TaskCompleted,

    /// Task reached `FAILED`.
    ///
    /// Sets: `task_id`, `task`, `attempt`, `reason`.
    TaskFailed,

    /// Task reached `CANCELLED`.
    ///
    /// Sets: `task_id`, `task`.
    TaskCancelled,
}

/// One lifecycle event. Which optional fields are set depends on [`EventKind`].
#[derive(Clone, Debug)]
pub struct Event {
    /// Process-wide increasing sequence number.
    pub seq: u64,
    /// When the event was created.
    pub at: SystemTime,
    pub kind: EventKind,
    /// Id of the task, if applicable.
    pub task_id: Option<TaskId>,
    /// Name of the task (or subscriber), if applicable.
    pub task: Option<Arc<str>>,
    /// Priority of the task, if applicable.
    pub priority: Option<Priority>,
    /// Attempt number (starting from 1).
    pub attempt: Option<u32>,
    /// [`Executor::kind`](crate::Executor::kind) of the task's executor.
    pub executor: Option<&'static str>,
    /// Attempt timeout in milliseconds.
    pub timeout_ms: Option<u32>,
    /// Delay before the next re-enqueue in milliseconds.
    pub delay_ms: Option<u32>,
    /// Error text, stuck task list or subscriber detail.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Stamps a fresh event of `kind`.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task_id: None,
            task: None,
            priority: None,
            attempt: None,
            executor: None,
            timeout_ms: None,
            delay_ms: None,
            reason: None,
        }
    }

    /// Attaches task identity.
    #[inline]
    pub fn with_task(mut self, id: TaskId, name: impl Into<Arc<str>>) -> Self {
        self.task_id = Some(id);
        self.task = Some(name.into());
        self
    }

    /// Attaches a name without an id (subscribers, runtime).
    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.task = Some(name.into());
        self
    }

    #[inline]
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    #[inline]
    pub fn with_executor(mut self, kind: &'static str) -> Self {
        self.executor = Some(kind);
        self
    }

    /// Timeout, saturated into milliseconds.
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        self.timeout_ms = Some(saturating_ms(d));
        self
    }

    /// Attaches a re-enqueue delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        self.delay_ms = Some(saturating_ms(d));
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// A subscriber lane dropped an event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_name(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// A subscriber panicked inside `on_event`.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_name(subscriber)
            .with_reason(info)
    }

    /// True for the three terminal task events.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskCompleted | EventKind::TaskFailed | EventKind::TaskCancelled
        )
    }
}

fn saturating_ms(d: Duration) -> u32 {
    d.as_millis().min(u128::from(u32::MAX)) as u32
}
