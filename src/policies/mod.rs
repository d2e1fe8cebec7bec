//! Retry policies.
//!
//! This module groups the knobs that control **whether** a failed attempt is
//! retried and **how long** the task waits before it re-enters the ready queue.
//!
//! ## Contents
//! - [`RetryPolicy`]   attempt budget (`max_retries`) plus the backoff to apply
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization strategy to avoid synchronized retries
//!
//! ## Quick wiring
//! ```text
//! TaskSpec { retry: RetryPolicy { max_retries, backoff }, timeout, .. }
//!      └─► core::registry::Registry::complete uses:
//!           - retry.allows(retry_count) to decide RETRYING vs FAILED
//!           - retry.delay_for(retry_count) to arm the re-enqueue timer
//! ```
//!
//! ## Defaults
//! - `max_retries = 3`.
//! - `BackoffPolicy::default()` → constant 1s (factor=1.0), max=60s, jitter=None.

mod backoff;
mod jitter;
mod retry;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use retry::RetryPolicy;
