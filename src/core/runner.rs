//! # Run a single attempt of a task.
//!
//! Hands one [`Attempt`] to its executor with an optional timeout and turns
//! every way an attempt can end into a `Result`.
//!
//! ```text
//! Success:   executor.run(ctx) → Ok(data)
//! Failure:   executor.run(ctx) → Err(Fail | Canceled)
//! Panic:     catch_unwind      → Err(Fail "executor panicked: ...")
//! Timeout:   timeout elapsed   → cancel attempt token
//!                              → publish TimeoutHit
//!                              → join the executor unless it is preemptible
//!                              → Err(Timeout)
//! ```
//!
//! ## Rules
//! - The attempt token is a child of the task token: cancelling the task
//!   reaches the executor, a timeout never cancels the task.
//! - The runner publishes only `TimeoutHit`; the registry publishes the
//!   outcome events once it has decided what the outcome means.
//! - `run_attempt` returns only once the attempt has stopped executing. For a
//!   non-preemptible executor a timeout is reported on time but the worker
//!   (and its slot) stays busy until the thread comes back.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde_json::Value;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{AttemptContext, ExecutorRef, TaskId, panic_message};

/// Everything a worker needs to run one attempt, detached from the registry lock.
pub(crate) struct Attempt {
    pub id: TaskId,
    pub name: Arc<str>,
    /// 1-based attempt number.
    pub number: u32,
    pub timeout: Option<Duration>,
    pub executor: ExecutorRef,
    pub token: CancellationToken,
}

/// Executes `attempt` once, publishing `TimeoutHit` to `bus` if it overruns.
pub(crate) async fn run_attempt(attempt: &Attempt, bus: &Bus) -> Result<Option<Value>, TaskError> {
    let ctx = AttemptContext::new(
        attempt.id,
        Arc::clone(&attempt.name),
        attempt.number,
        attempt.token.clone(),
    );
    let fut = AssertUnwindSafe(attempt.executor.run(ctx)).catch_unwind();
    tokio::pin!(fut);

    let res = match attempt.timeout.filter(|d| *d > Duration::ZERO) {
        Some(dur) => match time::timeout(dur, &mut fut).await {
            Ok(r) => r,
            Err(_elapsed) => {
                attempt.token.cancel();
                publish_timeout(bus, attempt, dur);
                if !attempt.executor.preemptible() {
                    let _late = fut.await;
                }
                return Err(TaskError::Timeout { timeout: dur });
            }
        },
        None => fut.await,
    };

    res.unwrap_or_else(|payload| {
        Err(TaskError::fail(format!(
            "executor panicked: {}",
            panic_message(payload)
        )))
    })
}

fn publish_timeout(bus: &Bus, attempt: &Attempt, dur: Duration) {
    bus.publish(
        Event::new(EventKind::TimeoutHit)
            .with_task(attempt.id, Arc::clone(&attempt.name))
            .with_attempt(attempt.number)
            .with_timeout(dur),
    );
}
