//! # LogWriter: lifecycle events as `tracing` records
//!
//! Maps every [`EventKind`] to one structured `tracing` record. The crate never
//! installs a global subscriber; wire `tracing-subscriber` (or anything else) in
//! the host application to see the output.
//!
//! | Event                         | Level   |
//! |-------------------------------|---------|
//! | submitted / starting / done   | `info`  |
//! | dependency-blocked            | `debug` |
//! | attempt failed / retry / timeout | `warn` |
//! | task failed / grace exceeded / subscriber trouble | `error` / `warn` |

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let id = e.task_id.map(|id| id.to_string()).unwrap_or_default();
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::TaskSubmitted => {
                tracing::info!(task, %id, priority = ?e.priority, "task added to queue");
            }
            EventKind::DependencyBlocked => {
                tracing::debug!(task, %id, recheck_ms = ?e.delay_ms, "waiting on dependencies");
            }
            EventKind::TaskStarting => {
                tracing::info!(
                    task,
                    %id,
                    attempt = ?e.attempt,
                    executor = e.executor.unwrap_or("-"),
                    "attempt starting"
                );
            }
            EventKind::TimeoutHit => {
                tracing::warn!(task, %id, timeout_ms = ?e.timeout_ms, "attempt timed out");
            }
            EventKind::AttemptFailed => {
                tracing::warn!(task, %id, attempt = ?e.attempt, error = reason, "attempt failed");
            }
            EventKind::RetryScheduled => {
                tracing::info!(
                    task,
                    %id,
                    after_attempt = ?e.attempt,
                    delay_ms = ?e.delay_ms,
                    error = reason,
                    "task will retry"
                );
            }
            EventKind::TaskCompleted => {
                tracing::info!(task, %id, attempts = ?e.attempt, "task completed successfully");
            }
            EventKind::TaskFailed => {
                tracing::error!(task, %id, attempts = ?e.attempt, error = reason, "task failed");
            }
            EventKind::TaskCancelled => {
                tracing::info!(task, %id, "task cancelled");
            }
            EventKind::SchedulerStarted => tracing::info!("scheduler started"),
            EventKind::ShutdownRequested => tracing::info!("scheduler shutdown requested"),
            EventKind::AllStoppedWithin => tracing::info!("all attempts stopped within grace"),
            EventKind::GraceExceeded => {
                tracing::error!(stuck = reason, "grace exceeded, aborting attempts");
            }
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked => {
                tracing::warn!(subscriber = task, detail = reason, "subscriber trouble");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
