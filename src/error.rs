//! Error types used by the taskdeck runtime and executors.
//!
//! Two enums, one per layer:
//!
//! - [`RuntimeError`]: errors raised by the scheduler runtime itself (lifecycle, waiting).
//! - [`TaskError`]: errors raised by a single executor attempt.
//!
//! Attempt errors never escape to callers of [`Scheduler::submit`](crate::Scheduler::submit):
//! they are folded into the task's [`WorkResult`](crate::WorkResult) and drive the retry logic.

use std::time::Duration;

use thiserror::Error;

use crate::tasks::TaskId;

/// # Errors produced by the scheduler runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `start()` was called while the dispatch loop is already running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// `stop()` was called while the dispatch loop is not running.
    #[error("scheduler is not running")]
    NotRunning,

    /// The task id was never submitted to this scheduler.
    #[error("unknown task {id}")]
    UnknownTask {
        /// The id that was looked up.
        id: TaskId,
    },

    /// `wait()` gave up before the task reached a terminal status.
    #[error("task {id} did not settle within {timeout:?}")]
    WaitTimeout {
        /// The awaited task.
        id: TaskId,
        /// How long the caller was willing to wait.
        timeout: Duration,
    },

    /// In-flight attempts did not finish within the grace period and were aborted.
    #[error("attempts still running {grace:?} after stop; aborted: {stuck:?}")]
    GraceExceeded {
        /// How long `stop()` waited.
        grace: Duration,
        /// Names of tasks whose attempts were still running.
        stuck: Vec<String>,
    },

    /// Installing OS signal handlers failed.
    #[error("signal handler registration failed: {0}")]
    Signal(#[from] std::io::Error),
}

impl RuntimeError {
    /// Stable snake_case label, handy as a log field.
    ///
    /// ```
    /// use std::time::Duration;
    /// use taskdeck::RuntimeError;
    ///
    /// let err = RuntimeError::WaitTimeout { id: taskdeck::TaskId::new(), timeout: Duration::from_millis(10) };
    /// assert_eq!(err.as_label(), "runtime_wait_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyRunning => "runtime_already_running",
            RuntimeError::NotRunning => "runtime_not_running",
            RuntimeError::UnknownTask { .. } => "runtime_unknown_task",
            RuntimeError::WaitTimeout { .. } => "runtime_wait_timeout",
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::Signal(_) => "runtime_signal",
        }
    }

    /// Longer, operator-facing description.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::GraceExceeded { grace, stuck } => {
                format!("stop waited {grace:?}; aborted {} attempt(s): {}", stuck.len(), stuck.join(", "))
            }
            other => other.to_string(),
        }
    }
}

/// # Errors produced by a single executor attempt.
///
/// `Fail` and `Timeout` count against the task's retry budget.
/// `Canceled` means the executor noticed the cancellation token and gave up;
/// the scheduler reports the task as cancelled and never retries it.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The attempt exceeded the task's timeout.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// Per-attempt limit of the task.
        timeout: Duration,
    },

    /// The attempt failed but may succeed if retried.
    #[error("{error}")]
    Fail {
        /// Human-readable cause, copied verbatim into `WorkResult::error`.
        error: String,
    },

    /// The executor observed cancellation and stopped early.
    #[error("cancelled")]
    Canceled,
}

impl TaskError {
    /// Shorthand for [`TaskError::Fail`].
    ///
    /// ```
    /// use taskdeck::TaskError;
    ///
    /// let err = TaskError::fail("image not found");
    /// assert_eq!(err.to_string(), "image not found");
    /// ```
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Stable snake_case label.
    ///
    /// ```
    /// assert_eq!(taskdeck::TaskError::Canceled.as_label(), "task_canceled");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Timeout { .. } => "task_timeout",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// `false` only for [`TaskError::Canceled`], which ends the task instead of retrying it.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Timeout { .. })
    }
}
