//! # Closure-backed executors.
//!
//! - [`ExecFn`] wraps `F: Fn(AttemptContext) -> Fut`, producing a fresh future per attempt.
//! - [`BlockingFn`] wraps a synchronous closure and runs it on tokio's blocking pool,
//!   so device or GUI calls that block the thread occupy a worker slot without stalling
//!   the runtime.
//!
//! Neither keeps hidden state between attempts; share state explicitly through
//! `Arc<...>` captured by the closure.
//!
//! ## Example
//! ```rust
//! use taskdeck::{AttemptContext, BlockingFn, ExecFn, ExecutorRef, TaskError};
//!
//! let wait: ExecutorRef = ExecFn::arc("wait", |ctx: AttemptContext| async move {
//!     tokio::select! {
//!         _ = ctx.cancelled() => Err(TaskError::Canceled),
//!         _ = tokio::time::sleep(std::time::Duration::from_millis(10)) => Ok(None),
//!     }
//! });
//!
//! let type_text: ExecutorRef = BlockingFn::arc("type-text", |ctx: &AttemptContext| {
//!     for _ch in "hello".chars() {
//!         ctx.checkpoint()?;
//!         // send one key...
//!     }
//!     Ok(None)
//! });
//! # let _ = (wait, type_text);
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TaskError;
use crate::tasks::executor::{AttemptContext, Executor};

/// Async-closure executor.
pub struct ExecFn<F> {
    kind: &'static str,
    f: F,
}

impl<F, Fut> ExecFn<F>
where
    F: Fn(AttemptContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, TaskError>> + Send + 'static,
{
    /// Creates a new closure-backed executor.
    pub fn new(kind: &'static str, f: F) -> Self {
        Self { kind, f }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(kind: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(kind, f))
    }
}

#[async_trait]
impl<F, Fut> Executor for ExecFn<F>
where
    F: Fn(AttemptContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<Value>, TaskError>> + Send + 'static,
{
    fn kind(&self) -> &'static str {
        self.kind
    }

    async fn run(&self, ctx: AttemptContext) -> Result<Option<Value>, TaskError> {
        (self.f)(ctx).await
    }
}

/// Blocking-closure executor, run through `tokio::task::spawn_blocking`.
///
/// A timed-out attempt cannot preempt the thread, so the attempt holds its
/// worker slot until the closure returns. Poll [`AttemptContext::checkpoint`]
/// to give the slot back promptly once the token fires.
pub struct BlockingFn<F> {
    kind: &'static str,
    f: Arc<F>,
}

impl<F> BlockingFn<F>
where
    F: Fn(&AttemptContext) -> Result<Option<Value>, TaskError> + Send + Sync + 'static,
{
    /// Creates a new blocking executor.
    pub fn new(kind: &'static str, f: F) -> Self {
        Self { kind, f: Arc::new(f) }
    }

    /// Creates the executor and returns it as a shared handle.
    pub fn arc(kind: &'static str, f: F) -> Arc<Self> {
        Arc::new(Self::new(kind, f))
    }
}

#[async_trait]
impl<F> Executor for BlockingFn<F>
where
    F: Fn(&AttemptContext) -> Result<Option<Value>, TaskError> + Send + Sync + 'static,
{
    fn kind(&self) -> &'static str {
        self.kind
    }

    fn preemptible(&self) -> bool {
        false
    }

    async fn run(&self, ctx: AttemptContext) -> Result<Option<Value>, TaskError> {
        let f = Arc::clone(&self.f);
        match tokio::task::spawn_blocking(move || f(&ctx)).await {
            Ok(res) => res,
            Err(join) if join.is_panic() => Err(TaskError::fail(format!(
                "executor panicked: {}",
                super::panic_message(join.into_panic())
            ))),
            Err(_) => Err(TaskError::Canceled),
        }
    }
}
