//! Live task counts per status.

use serde::Serialize;

use crate::tasks::TaskStatus;

/// Counts per status at the instant of the registry scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub pending: usize,
    pub running: usize,
    pub retrying: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    pub total: usize,
}

impl Stats {
    /// Folds a stream of statuses into counts.
    pub(crate) fn tally(statuses: impl IntoIterator<Item = TaskStatus>) -> Self {
        statuses.into_iter().fold(Self::default(), |mut s, status| {
            match status {
                TaskStatus::Pending => s.pending += 1,
                TaskStatus::Running => s.running += 1,
                TaskStatus::Retrying => s.retrying += 1,
                TaskStatus::Completed => s.completed += 1,
                TaskStatus::Failed => s.failed += 1,
                TaskStatus::Cancelled => s.cancelled += 1,
            }
            s.total += 1;
            s
        })
    }

    /// Tasks that have not reached a terminal status.
    pub fn unfinished(&self) -> usize {
        self.pending + self.running + self.retrying
    }
}
