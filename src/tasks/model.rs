//! # Task data model.
//!
//! Identity, priority, lifecycle status and the immutable attempt result.
//!
//! ## Status machine
//! ```text
//!              ┌────────────── cancel ──────────────┐
//!              │                                    ▼
//! PENDING ──► RUNNING ──► COMPLETED             CANCELLED
//!    ▲           │   └──► FAILED (retries exhausted)
//!    │           ▼
//!    └─────── RETRYING (timer re-enqueues)
//! ```
//! `COMPLETED`, `FAILED` and `CANCELLED` are terminal.

use std::fmt;
use std::time::{Duration, SystemTime};

use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Opaque, never-reused task identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex characters, used for default display names.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Dispatch priority; higher values leave the ready queue first.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low = 1,
    #[default]
    Normal = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    /// Numeric rank (1..=4).
    #[inline]
    pub fn rank(self) -> u8 {
        self as u8
    }
}

/// Lifecycle status of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Waiting in (or on its way back to) the ready queue.
    Pending,
    /// An attempt is in flight.
    Running,
    /// The last attempt failed; a timer will re-enqueue the task.
    Retrying,
    /// An attempt succeeded.
    Completed,
    /// The retry budget is exhausted.
    Failed,
    /// Cancellation was requested.
    Cancelled,
}

impl TaskStatus {
    /// True for `Completed`, `Failed` and `Cancelled`.
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled
        )
    }

    /// Stable lowercase label.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Retrying => "retrying",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the attempt that ended a task.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkResult {
    /// Whether the attempt succeeded.
    pub success: bool,
    /// Executor payload, if any.
    pub data: Option<Value>,
    /// Human-readable failure cause.
    pub error: Option<String>,
    /// Wall time the attempt took.
    pub execution_time: Duration,
    /// Retries consumed when the result was produced.
    pub retry_count: u32,
}

impl WorkResult {
    pub(crate) fn succeeded(data: Option<Value>, execution_time: Duration, retry_count: u32) -> Self {
        Self {
            success: true,
            data,
            error: None,
            execution_time,
            retry_count,
        }
    }

    pub(crate) fn failed(
        error: impl Into<String>,
        execution_time: Duration,
        retry_count: u32,
    ) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            execution_time,
            retry_count,
        }
    }
}

/// Point-in-time snapshot of a task record.
#[derive(Clone, Debug, Serialize)]
pub struct TaskInfo {
    pub id: TaskId,
    pub name: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub created_at: SystemTime,
    pub started_at: Option<SystemTime>,
    pub completed_at: Option<SystemTime>,
    pub timeout: Option<Duration>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub dependencies: Vec<TaskId>,
    pub cancel_requested: bool,
    pub result: Option<WorkResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_orders_by_rank() {
        assert!(Priority::Urgent > Priority::High);
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert_eq!(Priority::Urgent.rank(), 4);
        assert_eq!(Priority::default(), Priority::Normal);
    }

    #[test]
    fn terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(!TaskStatus::Retrying.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
    }

    #[test]
    fn ids_are_unique_and_short_form_has_eight_chars() {
        let a = TaskId::new();
        let b = TaskId::new();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Retrying).unwrap();
        assert_eq!(json, "\"retrying\"");
    }
}
