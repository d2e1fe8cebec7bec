//! # Backoff policy for retry delays.
//!
//! [`BackoffPolicy`] maps the number of retries already consumed by a task to the
//! delay before its next re-enqueue. It is parameterized by:
//! - [`BackoffPolicy::first`] the delay before the first retry;
//! - [`BackoffPolicy::factor`] the multiplicative growth factor;
//! - [`BackoffPolicy::max`] the cap.
//!
//! The delay before retry `n` (0-based) is `first × factor^n`, clamped to `max`,
//! then jittered. The base is derived from `n` alone, so jitter never feeds back
//! into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use taskdeck::{BackoffPolicy, JitterPolicy};
//!
//! let fixed = BackoffPolicy::constant(Duration::from_secs(1));
//! assert_eq!(fixed.delay(0), Duration::from_secs(1));
//! assert_eq!(fixed.delay(7), Duration::from_secs(1));
//!
//! let grow = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(1));
//! assert_eq!(grow.delay(1), Duration::from_millis(200));
//! assert_eq!(grow.delay(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Maximum delay cap.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant delay).
    pub factor: f64,
    /// Jitter applied on top of the computed base.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// Constant one second between attempts, capped at 60s, no jitter.
    fn default() -> Self {
        Self::constant(Duration::from_secs(1))
    }
}

impl BackoffPolicy {
    /// Same delay before every retry.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay.max(Duration::from_secs(60)),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// Delay grows by `factor` after every retry, up to `max`.
    pub fn exponential(first: Duration, factor: f64, max: Duration) -> Self {
        Self {
            first,
            max,
            factor,
            jitter: JitterPolicy::None,
        }
    }

    /// Returns the policy with a different jitter strategy.
    pub fn with_jitter(mut self, jitter: JitterPolicy) -> Self {
        self.jitter = jitter;
        self
    }

    /// Computes the delay before retry number `retry` (0 = first retry).
    ///
    /// Non-finite or negative intermediate values clamp to `max`.
    pub fn delay(&self, retry: u32) -> Duration {
        let max_secs = self.max.as_secs_f64();
        let exp = retry.min(i32::MAX as u32) as i32;
        let unclamped = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !unclamped.is_finite() || unclamped < 0.0 || unclamped > max_secs {
            self.max
        } else {
            Duration::from_secs_f64(unclamped)
        };

        self.jitter.spread(base, self.first.min(self.max), self.max)
    }
}
