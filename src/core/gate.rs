//! # Dependency gate.
//!
//! A task may run only when every id in its dependency set names a known task
//! whose status is `COMPLETED`.
//!
//! | dependency state              | verdict            |
//! |-------------------------------|--------------------|
//! | all `COMPLETED`               | `Ready`            |
//! | unknown id, or still active   | `Waiting`          |
//! | `FAILED` / `CANCELLED`        | `Broken(dep)`      |
//!
//! The gate never changes task state itself; the caller decides what `Broken`
//! means under the configured [`DependencyPolicy`](crate::DependencyPolicy).

use crate::tasks::{TaskId, TaskStatus};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Gate {
    Ready,
    Waiting,
    Broken(TaskId),
}

/// Evaluates `deps` against `lookup` (status by id across both registry partitions).
pub(crate) fn check<F>(deps: &[TaskId], lookup: F) -> Gate
where
    F: Fn(&TaskId) -> Option<TaskStatus>,
{
    let mut verdict = Gate::Ready;
    for dep in deps {
        match lookup(dep) {
            Some(TaskStatus::Completed) => {}
            Some(TaskStatus::Failed | TaskStatus::Cancelled) => return Gate::Broken(*dep),
            Some(_) | None => verdict = Gate::Waiting,
        }
    }
    verdict
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(map: &HashMap<TaskId, TaskStatus>) -> impl Fn(&TaskId) -> Option<TaskStatus> + '_ {
        move |id| map.get(id).copied()
    }

    #[test]
    fn no_dependencies_is_ready() {
        assert_eq!(check(&[], |_| None), Gate::Ready);
    }

    #[test]
    fn unknown_dependency_waits() {
        let map = HashMap::new();
        assert_eq!(check(&[TaskId::new()], lookup(&map)), Gate::Waiting);
    }

    #[test]
    fn every_dependency_must_be_completed() {
        let (a, b) = (TaskId::new(), TaskId::new());
        let mut map = HashMap::from([(a, TaskStatus::Completed), (b, TaskStatus::Retrying)]);
        assert_eq!(check(&[a, b], lookup(&map)), Gate::Waiting);

        map.insert(b, TaskStatus::Completed);
        assert_eq!(check(&[a, b], lookup(&map)), Gate::Ready);
    }

    #[test]
    fn failed_dependency_is_reported_even_behind_waiting_ones() {
        let (a, b) = (TaskId::new(), TaskId::new());
        let map = HashMap::from([(a, TaskStatus::Running), (b, TaskStatus::Cancelled)]);
        assert_eq!(check(&[a, b], lookup(&map)), Gate::Broken(b));
    }
}
