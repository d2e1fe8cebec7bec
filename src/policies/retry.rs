//! # Retry budget for failed attempts.
//!
//! [`RetryPolicy`] decides whether a failed or timed-out attempt sends the task
//! back to the ready queue (`RETRYING`) or ends it (`FAILED`).
//!
//! ```text
//! attempt fails, retry_count = r
//!   ├─ r < max_retries  → retry_count = r + 1, RETRYING, re-enqueue after backoff.delay(r)
//!   └─ r == max_retries → FAILED (terminal)
//! ```
//!
//! A task with `max_retries = N` therefore runs at most `N + 1` attempts.

use std::time::Duration;

use crate::policies::BackoffPolicy;

/// Attempt budget and delay strategy for one task.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay strategy between a failure and the re-enqueue.
    pub backoff: BackoffPolicy,
}

impl Default for RetryPolicy {
    /// Three retries, one second apart.
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first error.
    pub fn never() -> Self {
        Self {
            max_retries: 0,
            backoff: BackoffPolicy::constant(Duration::ZERO),
        }
    }

    /// `max_retries` retries with a constant `delay` between them.
    pub fn fixed(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            backoff: BackoffPolicy::constant(delay),
        }
    }

    /// True when a task that already consumed `retry_count` retries may try again.
    #[inline]
    pub fn allows(&self, retry_count: u32) -> bool {
        retry_count < self.max_retries
    }

    /// Delay before re-enqueueing after the failure that consumed retry `retry_count`.
    #[inline]
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        self.backoff.delay(retry_count)
    }
}
