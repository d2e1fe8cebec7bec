//! Wall-clock source for task timestamps.
//!
//! The scheduler stamps `created_at`, `started_at` and `completed_at` through an
//! injected [`Clock`] so tests can control time without touching the tokio timer.

use std::time::SystemTime;

/// Source of wall-clock timestamps.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> SystemTime;
}

/// [`Clock`] backed by [`SystemTime::now`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}
