//! # Global scheduler configuration.
//!
//! Provides [`Config`], the centralized settings for a [`Scheduler`](crate::Scheduler).
//!
//! Config is used in two ways:
//! 1. **Scheduler creation**: `Scheduler::builder(config)`
//! 2. **TaskSpec defaults**: `TaskSpec::with_defaults(executor, &config)`
//!
//! ## Sentinel values
//! - `max_workers = 0` → clamped to a single worker slot
//! - `timeout = 0s` → no per-attempt timeout
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::policies::{BackoffPolicy, RetryPolicy};

/// What the dependency gate does when a prerequisite ends in `FAILED` or `CANCELLED`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DependencyPolicy {
    /// Keep the dependent `PENDING` until the caller cancels it.
    #[default]
    Wait,
    /// Fail the dependent immediately with a "dependency did not complete" result.
    FailFast,
}

/// Global configuration for the scheduler runtime.
///
/// ## Field semantics
/// - `max_workers`: parallel execution slots (`0` = treated as 1)
/// - `poll_interval`: longest the dispatch loop blocks on an empty ready queue
/// - `dependency_recheck`: pause before a dependency-blocked task is re-queued
/// - `grace`: how long `stop()` waits for in-flight attempts
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `timeout`, `max_retries`, `backoff`: per-task defaults (`0s` timeout = none)
/// - `dependency_policy`: reaction to failed/cancelled prerequisites
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of attempts allowed to run at the same time.
    pub max_workers: usize,

    /// Bounded wait of a single ready-queue pop.
    ///
    /// The dispatch loop re-checks its shutdown token at least this often.
    pub poll_interval: Duration,

    /// Delay before a task rejected by the dependency gate goes back to the queue.
    pub dependency_recheck: Duration,

    /// Maximum time `stop()` waits for in-flight attempts before aborting them.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel.
    pub bus_capacity: usize,

    /// Default per-attempt timeout (`Duration::ZERO` = none).
    pub timeout: Duration,

    /// Default retry budget.
    pub max_retries: u32,

    /// Default delay strategy between a failed attempt and its re-enqueue.
    pub backoff: BackoffPolicy,

    /// Reaction to prerequisites that can no longer complete.
    pub dependency_policy: DependencyPolicy,
}

impl Config {
    /// Worker slots, never less than one.
    #[inline]
    pub fn worker_slots(&self) -> usize {
        self.max_workers.max(1)
    }

    /// Default per-task timeout as an `Option` (`None` = no timeout).
    #[inline]
    pub fn default_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Default retry policy assembled from `max_retries` and `backoff`.
    #[inline]
    pub fn default_retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: self.backoff,
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `max_workers = 4`
    /// - `poll_interval = 1s`
    /// - `dependency_recheck = 20ms`
    /// - `grace = 60s`
    /// - `bus_capacity = 1024`
    /// - `timeout = 30s`
    /// - `max_retries = 3`, `backoff` = constant 1s
    /// - `dependency_policy = Wait`
    fn default() -> Self {
        Self {
            max_workers: 4,
            poll_interval: Duration::from_secs(1),
            dependency_recheck: Duration::from_millis(20),
            grace: Duration::from_secs(60),
            bus_capacity: 1024,
            timeout: Duration::from_secs(30),
            max_retries: 3,
            backoff: BackoffPolicy::default(),
            dependency_policy: DependencyPolicy::Wait,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_are_normalized() {
        let cfg = Config {
            max_workers: 0,
            timeout: Duration::ZERO,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.worker_slots(), 1);
        assert_eq!(cfg.default_timeout(), None);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }

    #[test]
    fn default_retry_mirrors_fields() {
        let cfg = Config::default();
        let retry = cfg.default_retry();
        assert_eq!(retry.max_retries, 3);
        assert_eq!(retry.delay_for(0), Duration::from_secs(1));
        assert_eq!(cfg.default_timeout(), Some(Duration::from_secs(30)));
    }
}
