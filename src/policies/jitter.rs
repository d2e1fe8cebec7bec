//! # Spreading retry re-enqueues.
//!
//! When a window closes or a device disconnects, every task touching it fails
//! in the same instant. Without randomization their retry timers would all
//! fire together and the whole batch would land back in the ready queue on the
//! same tick. [`JitterPolicy`] picks where inside the backoff window each
//! task's re-enqueue falls.
//!
//! | Policy         | Re-enqueue after                         |
//! |----------------|------------------------------------------|
//! | `None`         | exactly the backoff delay                |
//! | `Full`         | anywhere in `0..=delay`                  |
//! | `Equal`        | at least half the delay, at most all of it |
//! | `Decorrelated` | anywhere in `floor..=delay * 3`, capped  |

use std::time::Duration;

use rand::Rng;

/// Where inside the backoff window a retry is re-enqueued.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum JitterPolicy {
    #[default]
    None,
    Full,
    Equal,
    /// Grows from the previous delay rather than the nominal one, so
    /// consecutive retries of one task drift apart from its neighbours.
    Decorrelated,
}

impl JitterPolicy {
    /// Randomizes the backoff `delay` computed for one retry.
    ///
    /// `floor` and `cap` only matter for [`Decorrelated`](Self::Decorrelated):
    /// the result never drops below `floor` and never exceeds `cap`.
    pub fn spread(&self, delay: Duration, floor: Duration, cap: Duration) -> Duration {
        let ms = millis(delay);
        match self {
            JitterPolicy::None => delay,
            JitterPolicy::Full => pick(0, ms),
            JitterPolicy::Equal => pick(ms / 2, ms),
            JitterPolicy::Decorrelated => {
                let lo = millis(floor);
                let hi = ms.saturating_mul(3).min(millis(cap)).max(lo);
                pick(lo, hi)
            }
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Uniform pick in `lo..=hi` milliseconds.
fn pick(lo: u64, hi: u64) -> Duration {
    if lo >= hi {
        return Duration::from_millis(lo);
    }
    Duration::from_millis(rand::rng().random_range(lo..=hi))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FLOOR: Duration = Duration::from_millis(10);
    const CAP: Duration = Duration::from_secs(5);

    #[test]
    fn none_keeps_the_backoff_delay() {
        let d = Duration::from_millis(1234);
        assert_eq!(JitterPolicy::None.spread(d, FLOOR, CAP), d);
    }

    #[test]
    fn full_and_equal_stay_inside_the_window() {
        let d = Duration::from_millis(80);
        for _ in 0..64 {
            assert!(JitterPolicy::Full.spread(d, FLOOR, CAP) <= d);
            let equal = JitterPolicy::Equal.spread(d, FLOOR, CAP);
            assert!(equal >= Duration::from_millis(40) && equal <= d);
        }
        assert_eq!(JitterPolicy::Full.spread(Duration::ZERO, FLOOR, CAP), Duration::ZERO);
    }

    #[test]
    fn decorrelated_respects_floor_and_cap() {
        let floor = Duration::from_millis(500);
        let got = JitterPolicy::Decorrelated.spread(
            Duration::from_millis(100),
            floor,
            Duration::from_millis(200),
        );
        assert_eq!(got, floor);

        for _ in 0..64 {
            let got = JitterPolicy::Decorrelated.spread(
                Duration::from_millis(100),
                Duration::from_millis(50),
                Duration::from_millis(250),
            );
            assert!(got >= Duration::from_millis(50) && got <= Duration::from_millis(250));
        }
    }
}
