//! # Task registry: the single source of truth for task state.
//!
//! Two partitions behind one `tokio::sync::Mutex`:
//! - **active**: PENDING / RUNNING / RETRYING tasks, with their executor and tokens,
//! - **completed**: COMPLETED / FAILED / CANCELLED snapshots, kept forever.
//!
//! ```text
//! submit ─► insert ─────────────► active ──► ReadyQueue
//! loop   ─► claim(entry) ───────► Gate ─► Running + Attempt
//! worker ─► complete(outcome) ──► Completed | Retrying | Failed | Cancelled
//! timer  ─► requeue_retry / requeue_blocked
//! api    ─► cancel(id) ─────────► completed (Cancelled)
//! ```
//!
//! ## Rules
//! - Every transition, queue push and lifecycle event happens under the lock,
//!   so observers never see a task in two partitions or events out of order.
//! - A terminal transition moves the record to `completed` and bumps the
//!   `settled` watch counter that [`Scheduler::wait`](crate::Scheduler::wait) follows.
//! - An outcome for a task that is no longer RUNNING that same attempt is dropped.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use serde_json::Value;
use tokio::sync::{Mutex, watch};
use tokio_util::sync::CancellationToken;

use crate::clock::Clock;
use crate::config::DependencyPolicy;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::policies::RetryPolicy;
use crate::tasks::{ExecutorRef, Priority, TaskId, TaskInfo, TaskSpec, TaskStatus, WorkResult};

use super::gate::{self, Gate};
use super::queue::{QueueEntry, ReadyQueue};
use super::runner::Attempt;
use super::stats::Stats;

struct TaskRecord {
    id: TaskId,
    name: Arc<str>,
    priority: Priority,
    status: TaskStatus,
    created_at: SystemTime,
    started_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
    retry_count: u32,
    attempts: u32,
    dependencies: Vec<TaskId>,
    cancel_requested: bool,
    result: Option<WorkResult>,
}

impl TaskRecord {
    fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            name: self.name.to_string(),
            priority: self.priority,
            status: self.status,
            created_at: self.created_at,
            started_at: self.started_at,
            completed_at: self.completed_at,
            timeout: self.timeout,
            retry_count: self.retry_count,
            max_retries: self.retry.max_retries,
            dependencies: self.dependencies.clone(),
            cancel_requested: self.cancel_requested,
            result: self.result.clone(),
        }
    }

    fn event(&self, kind: EventKind) -> Event {
        Event::new(kind).with_task(self.id, Arc::clone(&self.name))
    }
}

struct ActiveEntry {
    record: TaskRecord,
    executor: ExecutorRef,
    /// Task-level token; every attempt token is its child.
    token: CancellationToken,
    /// Token of the attempt currently on a worker slot.
    in_flight: Option<CancellationToken>,
    /// `DependencyBlocked` already published for the current wait.
    blocked_reported: bool,
}

#[derive(Default)]
struct State {
    active: HashMap<TaskId, ActiveEntry>,
    completed: HashMap<TaskId, TaskRecord>,
}

impl State {
    fn record(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.active
            .get(id)
            .map(|e| &e.record)
            .or_else(|| self.completed.get(id))
    }

    fn status_of(&self, id: &TaskId) -> Option<TaskStatus> {
        self.record(id).map(|r| r.status)
    }
}

/// What the dispatch loop should do with a popped queue entry.
pub(crate) enum Claim {
    /// Gate passed; the task is RUNNING and the attempt must go to a worker.
    Dispatch(Attempt),
    /// Dependencies are not satisfied yet; re-enqueue the same entry later.
    Blocked,
    /// Stale entry (cancelled, settled, or not PENDING); drop it.
    Skipped,
}

/// Delayed re-enqueue requested by a failed attempt.
#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryPlan {
    pub id: TaskId,
    pub delay: Duration,
}

pub(crate) struct Registry {
    state: Mutex<State>,
    queue: ReadyQueue,
    bus: Bus,
    clock: Arc<dyn Clock>,
    settled: watch::Sender<u64>,
}

impl Registry {
    pub fn new(bus: Bus, clock: Arc<dyn Clock>) -> Self {
        let (settled, _rx) = watch::channel(0);
        Self {
            state: Mutex::new(State::default()),
            queue: ReadyQueue::new(),
            bus,
            clock,
            settled,
        }
    }

    pub fn queue(&self) -> &ReadyQueue {
        &self.queue
    }

    /// Receiver that changes on every terminal transition.
    pub fn settled(&self) -> watch::Receiver<u64> {
        self.settled.subscribe()
    }

    /// Registers `spec` as PENDING and enqueues it.
    ///
    /// Ids are never reused: a spec whose id is already known gets a fresh one.
    pub async fn insert(&self, spec: TaskSpec) -> TaskId {
        let mut st = self.state.lock().await;

        let mut id = spec.id();
        if st.status_of(&id).is_some() {
            let fresh = TaskId::new();
            tracing::warn!(%id, %fresh, "task id already registered, assigning a fresh one");
            id = fresh;
        }

        let record = TaskRecord {
            id,
            name: Arc::from(spec.name()),
            priority: spec.priority(),
            status: TaskStatus::Pending,
            created_at: self.clock.now(),
            started_at: None,
            completed_at: None,
            timeout: spec.timeout(),
            retry: spec.retry(),
            retry_count: 0,
            attempts: 0,
            dependencies: spec.dependencies().to_vec(),
            cancel_requested: false,
            result: None,
        };
        self.bus
            .publish(record.event(EventKind::TaskSubmitted).with_priority(record.priority));
        self.queue.push_new(id, record.priority);

        st.active.insert(
            id,
            ActiveEntry {
                record,
                executor: Arc::clone(spec.executor()),
                token: CancellationToken::new(),
                in_flight: None,
                blocked_reported: false,
            },
        );
        id
    }

    /// Runs the popped `entry` through the gate and, if it passes, marks it RUNNING.
    pub async fn claim(&self, entry: QueueEntry, policy: DependencyPolicy, recheck: Duration) -> Claim {
        let mut st = self.state.lock().await;

        let verdict = match st.active.get(&entry.id) {
            Some(e) if e.record.status == TaskStatus::Pending => {
                gate::check(&e.record.dependencies, |dep| st.status_of(dep))
            }
            _ => return Claim::Skipped,
        };

        match verdict {
            Gate::Ready => {}
            Gate::Broken(dep) if policy == DependencyPolicy::FailFast => {
                let retries = st.active.get(&entry.id).map_or(0, |e| e.record.retry_count);
                let result = WorkResult::failed(
                    format!("dependency {dep} did not complete"),
                    Duration::ZERO,
                    retries,
                );
                self.settle(&mut st, entry.id, TaskStatus::Failed, Some(result));
                return Claim::Skipped;
            }
            Gate::Broken(_) | Gate::Waiting => {
                if let Some(e) = st.active.get_mut(&entry.id) {
                    if !e.blocked_reported {
                        e.blocked_reported = true;
                        self.bus
                            .publish(e.record.event(EventKind::DependencyBlocked).with_delay(recheck));
                    }
                }
                return Claim::Blocked;
            }
        }

        let Some(e) = st.active.get_mut(&entry.id) else {
            return Claim::Skipped;
        };
        let rec = &mut e.record;
        rec.status = TaskStatus::Running;
        rec.attempts += 1;
        if rec.started_at.is_none() {
            rec.started_at = Some(self.clock.now());
        }
        e.blocked_reported = false;

        let token = e.token.child_token();
        e.in_flight = Some(token.clone());

        self.bus.publish(
            e.record
                .event(EventKind::TaskStarting)
                .with_priority(e.record.priority)
                .with_attempt(e.record.attempts)
                .with_executor(e.executor.kind()),
        );

        Claim::Dispatch(Attempt {
            id: entry.id,
            name: Arc::clone(&e.record.name),
            number: e.record.attempts,
            timeout: e.record.timeout,
            executor: Arc::clone(&e.executor),
            token,
        })
    }

    /// Routes the outcome of attempt `attempt` of task `id`.
    ///
    /// Returns a [`RetryPlan`] when the task went to RETRYING; the caller owns the timer.
    pub async fn complete(
        &self,
        id: TaskId,
        attempt: u32,
        outcome: Result<Option<Value>, TaskError>,
        elapsed: Duration,
    ) -> Option<RetryPlan> {
        let mut st = self.state.lock().await;

        let e = st.active.get_mut(&id)?;
        if e.record.status != TaskStatus::Running || e.record.attempts != attempt {
            tracing::debug!(%id, attempt, "dropping stale attempt outcome");
            return None;
        }
        e.in_flight = None;
        let retries = e.record.retry_count;

        match outcome {
            Ok(data) => {
                let result = WorkResult::succeeded(data, elapsed, retries);
                self.settle(&mut st, id, TaskStatus::Completed, Some(result));
                None
            }
            Err(err) if !err.is_retryable() => {
                e.record.cancel_requested = true;
                self.settle(&mut st, id, TaskStatus::Cancelled, None);
                None
            }
            Err(err) => {
                let reason = err.to_string();
                self.bus.publish(
                    e.record
                        .event(EventKind::AttemptFailed)
                        .with_attempt(attempt)
                        .with_reason(reason.as_str()),
                );

                if e.record.retry.allows(retries) {
                    let delay = e.record.retry.delay_for(retries);
                    e.record.retry_count += 1;
                    e.record.status = TaskStatus::Retrying;
                    self.bus.publish(
                        e.record
                            .event(EventKind::RetryScheduled)
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(reason),
                    );
                    Some(RetryPlan { id, delay })
                } else {
                    let result = WorkResult::failed(reason, elapsed, retries);
                    self.settle(&mut st, id, TaskStatus::Failed, Some(result));
                    None
                }
            }
        }
    }

    /// Moves a RETRYING task back to PENDING under a fresh queue sequence.
    pub async fn requeue_retry(&self, id: TaskId) {
        let mut st = self.state.lock().await;
        if let Some(e) = st.active.get_mut(&id) {
            if e.record.status == TaskStatus::Retrying {
                e.record.status = TaskStatus::Pending;
                self.queue.push_new(id, e.record.priority);
            }
        }
    }

    /// Puts a dependency-blocked entry back with its original key.
    pub async fn requeue_blocked(&self, entry: QueueEntry) {
        let st = self.state.lock().await;
        if st.status_of(&entry.id) == Some(TaskStatus::Pending) {
            self.queue.push(entry);
        }
    }

    /// Cancels a non-terminal task. Returns `false` for unknown or settled ids.
    pub async fn cancel(&self, id: TaskId) -> bool {
        let mut st = self.state.lock().await;
        let Some(e) = st.active.get_mut(&id) else {
            return false;
        };
        e.record.cancel_requested = true;
        e.token.cancel();
        self.settle(&mut st, id, TaskStatus::Cancelled, None);
        true
    }

    /// `(id, attempt, name)` of every RUNNING task.
    pub async fn running(&self) -> Vec<(TaskId, u32, String)> {
        let st = self.state.lock().await;
        st.active
            .values()
            .filter(|e| e.record.status == TaskStatus::Running)
            .map(|e| (e.record.id, e.record.attempts, e.record.name.to_string()))
            .collect()
    }

    pub async fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.state.lock().await.status_of(&id)
    }

    pub async fn result(&self, id: TaskId) -> Option<WorkResult> {
        self.state.lock().await.record(&id).and_then(|r| r.result.clone())
    }

    pub async fn info(&self, id: TaskId) -> Option<TaskInfo> {
        self.state.lock().await.record(&id).map(TaskRecord::info)
    }

    pub async fn stats(&self) -> Stats {
        let st = self.state.lock().await;
        Stats::tally(
            st.active
                .values()
                .map(|e| e.record.status)
                .chain(st.completed.values().map(|r| r.status)),
        )
    }

    /// Terminal transition: stamp, attach result, move to `completed`, publish, notify waiters.
    fn settle(&self, st: &mut State, id: TaskId, status: TaskStatus, result: Option<WorkResult>) {
        let Some(mut e) = st.active.remove(&id) else {
            return;
        };
        if let Some(token) = e.in_flight.take() {
            token.cancel();
        }

        let rec = &mut e.record;
        rec.status = status;
        rec.completed_at = Some(self.clock.now());
        if result.is_some() {
            rec.result = result;
        }

        let ev = match status {
            TaskStatus::Completed => rec.event(EventKind::TaskCompleted).with_attempt(rec.attempts),
            TaskStatus::Failed => {
                let reason = rec
                    .result
                    .as_ref()
                    .and_then(|r| r.error.clone())
                    .unwrap_or_default();
                rec.event(EventKind::TaskFailed)
                    .with_attempt(rec.attempts)
                    .with_reason(reason)
            }
            _ => rec.event(EventKind::TaskCancelled),
        };
        self.bus.publish(ev);

        st.completed.insert(id, e.record);
        self.settled.send_modify(|n| *n += 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::tasks::{AttemptContext, ExecFn};

    fn registry() -> Registry {
        Registry::new(Bus::new(64), Arc::new(SystemClock))
    }

    fn spec() -> TaskSpec {
        TaskSpec::new(ExecFn::arc("noop", |_ctx: AttemptContext| async {
            Ok::<_, TaskError>(None)
        }))
    }

    async fn claim_next(reg: &Registry) -> Claim {
        let entry = reg.queue().try_pop().expect("queued entry");
        reg.claim(entry, DependencyPolicy::Wait, Duration::from_millis(20))
            .await
    }

    #[tokio::test]
    async fn insert_then_claim_runs_first_attempt() {
        let reg = registry();
        let id = reg.insert(spec()).await;
        assert_eq!(reg.status(id).await, Some(TaskStatus::Pending));

        let Claim::Dispatch(attempt) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };
        assert_eq!(attempt.number, 1);
        let info = reg.info(id).await.unwrap();
        assert_eq!(info.status, TaskStatus::Running);
        assert!(info.started_at.is_some());
    }

    #[tokio::test]
    async fn duplicate_spec_gets_fresh_id() {
        let reg = registry();
        let s = spec();
        let a = reg.insert(s.clone()).await;
        let b = reg.insert(s).await;
        assert_ne!(a, b);
        assert_eq!(reg.stats().await.total, 2);
    }

    #[tokio::test]
    async fn failure_within_budget_schedules_retry() {
        let reg = registry();
        let id = reg.insert(spec().with_max_retries(1)).await;
        let Claim::Dispatch(a) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };

        let plan = reg
            .complete(id, a.number, Err(TaskError::fail("nope")), Duration::ZERO)
            .await
            .expect("retry planned");
        assert_eq!(plan.id, id);
        assert_eq!(reg.status(id).await, Some(TaskStatus::Retrying));

        reg.requeue_retry(id).await;
        assert_eq!(reg.status(id).await, Some(TaskStatus::Pending));
        let Claim::Dispatch(b) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };
        assert_eq!(b.number, 2);

        assert!(reg
            .complete(id, b.number, Err(TaskError::fail("still no")), Duration::ZERO)
            .await
            .is_none());
        let res = reg.result(id).await.unwrap();
        assert!(!res.success);
        assert_eq!(res.error.as_deref(), Some("still no"));
        assert_eq!(res.retry_count, 1);
        assert_eq!(reg.status(id).await, Some(TaskStatus::Failed));
    }

    #[tokio::test]
    async fn cancel_moves_to_completed_and_drops_late_outcome() {
        let reg = registry();
        let id = reg.insert(spec()).await;
        let Claim::Dispatch(a) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };

        assert!(reg.cancel(id).await);
        assert!(a.token.is_cancelled());
        assert!(!reg.cancel(id).await);

        assert!(reg.complete(id, a.number, Ok(None), Duration::ZERO).await.is_none());
        let info = reg.info(id).await.unwrap();
        assert_eq!(info.status, TaskStatus::Cancelled);
        assert!(info.cancel_requested);
        assert!(info.completed_at.is_some());
        assert!(info.result.is_none());
    }

    #[tokio::test]
    async fn cancel_during_retry_delay_makes_requeue_a_no_op() {
        let reg = registry();
        let id = reg.insert(spec().with_max_retries(3)).await;
        let Claim::Dispatch(a) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };
        reg.complete(id, a.number, Err(TaskError::fail("nope")), Duration::ZERO)
            .await
            .expect("retry planned");
        assert_eq!(reg.status(id).await, Some(TaskStatus::Retrying));

        assert!(reg.cancel(id).await);
        reg.requeue_retry(id).await;

        assert_eq!(reg.status(id).await, Some(TaskStatus::Cancelled));
        assert!(reg.queue().try_pop().is_none());
        assert_eq!(reg.info(id).await.unwrap().retry_count, 1);
    }

    #[tokio::test]
    async fn starting_event_names_executor_kind() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let reg = Registry::new(bus, Arc::new(SystemClock));
        reg.insert(spec()).await;
        let Claim::Dispatch(_) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };

        loop {
            let ev = rx.recv().await.unwrap();
            if ev.kind == EventKind::TaskStarting {
                assert_eq!(ev.executor, Some("noop"));
                assert_eq!(ev.attempt, Some(1));
                break;
            }
        }
    }

    #[tokio::test]
    async fn cancelled_entry_is_skipped_on_pop() {
        let reg = registry();
        let id = reg.insert(spec()).await;
        reg.cancel(id).await;
        assert!(matches!(claim_next(&reg).await, Claim::Skipped));
        assert_eq!(reg.info(id).await.unwrap().started_at, None);
    }

    #[tokio::test]
    async fn fail_fast_fails_dependent_of_failed_task() {
        let reg = registry();
        let dep = reg.insert(spec().with_max_retries(0)).await;
        let Claim::Dispatch(a) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };
        reg.complete(dep, a.number, Err(TaskError::fail("x")), Duration::ZERO)
            .await;

        let child = reg.insert(spec().depends_on(dep)).await;
        let entry = reg.queue().try_pop().unwrap();
        assert!(matches!(
            reg.claim(entry, DependencyPolicy::Wait, Duration::ZERO).await,
            Claim::Blocked
        ));
        assert_eq!(reg.status(child).await, Some(TaskStatus::Pending));

        assert!(matches!(
            reg.claim(entry, DependencyPolicy::FailFast, Duration::ZERO).await,
            Claim::Skipped
        ));
        let res = reg.result(child).await.unwrap();
        assert_eq!(res.error, Some(format!("dependency {dep} did not complete")));
    }

    #[tokio::test]
    async fn stats_cover_both_partitions() {
        let reg = registry();
        let done = reg.insert(spec()).await;
        let _pending = reg.insert(spec()).await;
        let Claim::Dispatch(a) = claim_next(&reg).await else {
            panic!("expected dispatch");
        };
        assert_eq!(a.id, done);
        reg.complete(done, a.number, Ok(None), Duration::ZERO).await;

        let s = reg.stats().await;
        assert_eq!((s.pending, s.completed, s.total), (1, 1, 2));
    }
}
