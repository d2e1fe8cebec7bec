//! # Task model, executors and specifications.
//!
//! This module provides the task-related types:
//! - [`TaskId`], [`Priority`], [`TaskStatus`], [`WorkResult`], [`TaskInfo`] - data model
//! - [`Executor`] - trait for the pluggable side effect of a task
//! - [`AttemptContext`] - per-attempt view passed to executors (cancellation, attempt number)
//! - [`ExecFn`], [`BlockingFn`] - closure-backed executors
//! - [`TaskSpec`] - submission bundle (executor + priority + retry + dependencies)

mod exec_fn;
mod executor;
mod model;
mod spec;

pub use exec_fn::{BlockingFn, ExecFn};
pub use executor::{AttemptContext, Executor, ExecutorRef};
pub use model::{Priority, TaskId, TaskInfo, TaskStatus, WorkResult};
pub use spec::TaskSpec;

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
