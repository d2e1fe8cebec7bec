//! # Work executor abstraction.
//!
//! The scheduler never performs a side effect itself: every attempt is handed to
//! an [`Executor`] together with an [`AttemptContext`]. Clicking a button or
//! matching an image: each task kind is one implementation of this trait.
//!
//! Cancellation is cooperative. The context exposes a read-only view of the
//! task's cancellation token; executors should check it between steps and
//! return [`TaskError::Canceled`] (or any error) promptly once it fires.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::TaskId;

/// Shared handle to an executor.
pub type ExecutorRef = Arc<dyn Executor>;

/// Per-attempt view handed to an [`Executor`].
#[derive(Clone, Debug)]
pub struct AttemptContext {
    task_id: TaskId,
    name: Arc<str>,
    attempt: u32,
    token: CancellationToken,
}

impl AttemptContext {
    pub(crate) fn new(task_id: TaskId, name: Arc<str>, attempt: u32, token: CancellationToken) -> Self {
        Self {
            task_id,
            name,
            attempt,
            token,
        }
    }

    /// Id of the task this attempt belongs to.
    pub fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Display name of the task.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Attempt number, starting at 1.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Retries consumed before this attempt.
    pub fn retry_count(&self) -> u32 {
        self.attempt.saturating_sub(1)
    }

    /// True once cancellation was requested or the attempt timed out.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves when cancellation is requested or the attempt times out.
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Returns `Err(TaskError::Canceled)` if cancellation was requested.
    ///
    /// Handy as a `?` checkpoint between steps.
    pub fn checkpoint(&self) -> Result<(), TaskError> {
        if self.is_cancelled() {
            Err(TaskError::Canceled)
        } else {
            Ok(())
        }
    }

    /// A clone of the underlying token, e.g. to hand to a blocking thread.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }
}

/// # Capability that performs one task's side effect.
///
/// Invoked once per attempt; must be safe to call again on retry.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use taskdeck::{AttemptContext, Executor, TaskError};
///
/// struct Click { x: i32, y: i32 }
///
/// #[async_trait]
/// impl Executor for Click {
///     fn kind(&self) -> &'static str { "click" }
///
///     async fn run(&self, ctx: AttemptContext) -> Result<Option<Value>, TaskError> {
///         ctx.checkpoint()?;
///         // send the click...
///         Ok(Some(json!({ "x": self.x, "y": self.y })))
///     }
/// }
/// ```
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Short label of the executor kind, carried on `TaskStarting` events.
    fn kind(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Whether dropping the future returned by [`run`](Self::run) stops the work.
    ///
    /// Executors that hand work to a thread (`spawn_blocking`, a device driver
    /// call) return `false`. A timed-out attempt of such an executor keeps its
    /// worker slot, and its task's next attempt waits, until `run` returns.
    fn preemptible(&self) -> bool {
        true
    }

    /// Performs one attempt.
    ///
    /// `Ok(data)` completes the task with `data` as payload; `Err` fails the
    /// attempt and the scheduler decides whether to retry.
    async fn run(&self, ctx: AttemptContext) -> Result<Option<Value>, TaskError>;
}
