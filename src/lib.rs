//! # taskdeck
//!
//! **Taskdeck** is an in-process task scheduler for automation workloads:
//! clicks, image searches, keystrokes and other side effects that must run in
//! priority order, after their prerequisites, with bounded retries.
//!
//! Each task carries a [`Priority`], an optional set of dependency ids, a
//! timeout, a [`RetryPolicy`] and an [`Executor`] that performs the actual work.
//! The scheduler decides *when* and *how often* to run it; the executor decides
//! *what* happens.
//!
//! ## Architecture
//! ```text
//!   submit(TaskSpec) ─────────────┐
//!                                 ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Scheduler                                                        │
//! │  - Registry (active + completed partitions, one lock)             │
//! │  - ReadyQueue (priority desc, submission order)                   │
//! │  - Semaphore (max_workers slots)                                  │
//! │  - Bus (broadcast lifecycle events)                               │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        ▼
//!   Dispatcher loop ──► Gate (dependencies COMPLETED?) ──► worker slot
//!                          │ no                              │
//!                          ▼                                 ▼
//!                  re-check timer                run_attempt(timeout, panic capture)
//!                                                            │
//!                    Completed / Failed / Cancelled ◄────────┤
//!                    Retrying ─► backoff timer ─► ReadyQueue ◄┘
//!
//! Bus ──► listener ──► SubscriberSet ──► per-subscriber workers (LogWriter, ...)
//! ```
//!
//! ### Task lifecycle
//! ```text
//! PENDING ──► RUNNING ──► COMPLETED
//!    ▲           ├──────► FAILED      (retries exhausted)
//!    │           └──────► RETRYING ───┐
//!    └────────────────────────────────┘ (after backoff delay)
//!
//! cancel(): PENDING | RUNNING | RETRYING ──► CANCELLED
//! ```
//!
//! ## Features
//! | Area              | Description                                             | Key types / traits                         |
//! |-------------------|---------------------------------------------------------|--------------------------------------------|
//! | **Scheduling**    | Priority queue, dependency gate, bounded worker pool.   | [`Scheduler`], [`SchedulerBuilder`]        |
//! | **Tasks**         | Pluggable side effects and submission specs.            | [`Executor`], [`ExecFn`], [`BlockingFn`], [`TaskSpec`] |
//! | **Policies**      | Retry budget, backoff growth and jitter.                | [`RetryPolicy`], [`BackoffPolicy`], [`JitterPolicy`] |
//! | **Subscriber API**| Observe lifecycle events.                               | [`Subscribe`], [`Event`], [`EventKind`]    |
//! | **Errors**        | Typed runtime and attempt errors.                       | [`RuntimeError`], [`TaskError`]            |
//! | **Configuration** | Worker count, defaults, pacing, shutdown grace.         | [`Config`], [`DependencyPolicy`]           |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], which turns events into `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use taskdeck::{AttemptContext, Config, ExecFn, Priority, Scheduler, TaskError, TaskStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.max_workers = 2;
//!     cfg.backoff = taskdeck::BackoffPolicy::constant(Duration::from_millis(10));
//!
//!     let subs: Vec<Arc<dyn taskdeck::Subscribe>> = {
//!         #[cfg(feature = "logging")]
//!         { vec![Arc::new(taskdeck::LogWriter::new())] }
//!         #[cfg(not(feature = "logging"))]
//!         { Vec::new() }
//!     };
//!     let sched = Scheduler::builder(cfg).with_subscribers(subs).build();
//!
//!     let type_text = ExecFn::arc("type-text", |ctx: AttemptContext| async move {
//!         ctx.checkpoint()?;
//!         Ok::<_, TaskError>(Some(serde_json::json!({ "typed": "hello" })))
//!     });
//!     let id = sched
//!         .submit(sched.spec(type_text).with_name("greet").with_priority(Priority::Urgent))
//!         .await;
//!
//!     sched.start().await?;
//!     assert_eq!(sched.wait(id, Duration::from_secs(5)).await?, TaskStatus::Completed);
//!     assert!(sched.result(id).await.is_some_and(|r| r.success));
//!     sched.stop().await?;
//!     Ok(())
//! }
//! ```

mod clock;
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use clock::{Clock, SystemClock};
pub use config::{Config, DependencyPolicy};
pub use core::{Scheduler, SchedulerBuilder, Stats};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use policies::{BackoffPolicy, JitterPolicy, RetryPolicy};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{
    AttemptContext, BlockingFn, ExecFn, Executor, ExecutorRef, Priority, TaskId, TaskInfo, TaskSpec,
    TaskStatus, WorkResult,
};

#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
