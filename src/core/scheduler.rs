//! # Scheduler: the public face of the runtime.
//!
//! [`Scheduler`] owns the registry, the worker-slot semaphore and the event bus,
//! and starts/stops the dispatch loop on demand.
//!
//! ```text
//! submit ─► Registry::insert ─► ReadyQueue
//!                                   │
//! start() ─► spawn Dispatcher ──────┘──► workers ──► Registry::complete
//!                                                      └─► retry timers
//! stop()  ─► cancel loop token ─► drain within grace
//! ```
//!
//! Submitting before `start()` is allowed: tasks stay PENDING until the loop runs.
//! After `stop()` the scheduler can be started again; queued tasks are kept.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskdeck::{AttemptContext, Config, ExecFn, Priority, Scheduler, TaskError, TaskSpec, TaskStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sched = Scheduler::new(Config::default());
//!
//!     let find = ExecFn::arc("find-image", |_ctx: AttemptContext| async {
//!         Ok::<_, TaskError>(Some(serde_json::json!({ "x": 120, "y": 48 })))
//!     });
//!     let find = sched.submit(TaskSpec::new(find).with_priority(Priority::High)).await;
//!
//!     let click = ExecFn::arc("click", |_ctx: AttemptContext| async { Ok::<_, TaskError>(None) });
//!     let click = sched.submit(TaskSpec::new(click).depends_on(find)).await;
//!
//!     sched.start().await?;
//!     let status = sched.wait(click, Duration::from_secs(5)).await?;
//!     assert_eq!(status, TaskStatus::Completed);
//!     sched.stop().await?;
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use super::{builder::SchedulerBuilder, dispatcher::Dispatcher, registry::Registry, shutdown, stats::Stats};
use crate::{
    config::Config,
    error::RuntimeError,
    events::{Bus, Event, EventKind},
    tasks::{ExecutorRef, TaskId, TaskInfo, TaskSpec, TaskStatus, WorkResult},
};

struct RunHandle {
    token: CancellationToken,
    join: JoinHandle<Result<(), RuntimeError>>,
}

/// Priority- and dependency-aware task scheduler.
pub struct Scheduler {
    cfg: Config,
    bus: Bus,
    registry: Arc<Registry>,
    slots: Arc<Semaphore>,
    listener: CancellationToken,
    run: Mutex<Option<RunHandle>>,
}

impl Scheduler {
    pub(super) fn new_internal(
        cfg: Config,
        bus: Bus,
        registry: Arc<Registry>,
        slots: Arc<Semaphore>,
        listener: CancellationToken,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            slots,
            listener,
            run: Mutex::new(None),
        }
    }

    /// Scheduler with default clock and no subscribers.
    pub fn new(cfg: Config) -> Arc<Self> {
        SchedulerBuilder::new(cfg).build()
    }

    pub fn builder(cfg: Config) -> SchedulerBuilder {
        SchedulerBuilder::new(cfg)
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Spec for `executor` carrying this scheduler's default timeout and retry policy.
    pub fn spec(&self, executor: ExecutorRef) -> TaskSpec {
        TaskSpec::with_defaults(executor, &self.cfg)
    }

    /// Raw lifecycle event stream (only events published after this call).
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Registers a task as PENDING and enqueues it. Never fails.
    pub async fn submit(&self, spec: TaskSpec) -> TaskId {
        self.registry.insert(spec).await
    }

    /// Requests cancellation.
    ///
    /// Returns `true` if the task was PENDING, RUNNING or RETRYING; it is now
    /// CANCELLED and will never run again. Returns `false` for unknown or
    /// already-terminal ids.
    pub async fn cancel(&self, id: TaskId) -> bool {
        self.registry.cancel(id).await
    }

    pub async fn status(&self, id: TaskId) -> Option<TaskStatus> {
        self.registry.status(id).await
    }

    /// Result of the attempt that ended the task; `None` while it is unfinished
    /// or when it was cancelled.
    pub async fn result(&self, id: TaskId) -> Option<WorkResult> {
        self.registry.result(id).await
    }

    pub async fn info(&self, id: TaskId) -> Option<TaskInfo> {
        self.registry.info(id).await
    }

    pub async fn stats(&self) -> Stats {
        self.registry.stats().await
    }

    /// Waits until `id` reaches a terminal status.
    ///
    /// # Errors
    /// - [`RuntimeError::UnknownTask`] if `id` was never submitted;
    /// - [`RuntimeError::WaitTimeout`] if it is still unfinished after `timeout`.
    pub async fn wait(&self, id: TaskId, timeout: Duration) -> Result<TaskStatus, RuntimeError> {
        let mut settled = self.registry.settled();
        let until_settled = async {
            loop {
                match self.registry.status(id).await {
                    None => return Err(RuntimeError::UnknownTask { id }),
                    Some(status) if status.is_terminal() => return Ok(status),
                    Some(_) => {}
                }
                if settled.changed().await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
        };

        time::timeout(timeout, until_settled)
            .await
            .unwrap_or(Err(RuntimeError::WaitTimeout { id, timeout }))
    }

    pub async fn is_running(&self) -> bool {
        self.run
            .lock()
            .await
            .as_ref()
            .is_some_and(|h| !h.join.is_finished())
    }

    /// Spawns the dispatch loop.
    ///
    /// # Errors
    /// [`RuntimeError::AlreadyRunning`] if the loop is already active.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let mut run = self.run.lock().await;
        if run.as_ref().is_some_and(|h| !h.join.is_finished()) {
            return Err(RuntimeError::AlreadyRunning);
        }

        let token = CancellationToken::new();
        let dispatcher = Dispatcher::new(
            &self.cfg,
            Arc::clone(&self.registry),
            self.bus.clone(),
            Arc::clone(&self.slots),
        );
        self.bus.publish(Event::new(EventKind::SchedulerStarted));
        let join = tokio::spawn(dispatcher.run(token.clone()));

        *run = Some(RunHandle { token, join });
        Ok(())
    }

    /// Stops dispatching and waits for in-flight attempts within `grace`.
    ///
    /// # Errors
    /// - [`RuntimeError::NotRunning`] if `start()` was never called (or already stopped);
    /// - [`RuntimeError::GraceExceeded`] if attempts had to be aborted.
    pub async fn stop(&self) -> Result<(), RuntimeError> {
        let handle = self.run.lock().await.take().ok_or(RuntimeError::NotRunning)?;

        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        handle.token.cancel();

        match handle.join.await {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = %err, "dispatch loop terminated abnormally");
                Ok(())
            }
        }
    }

    /// Starts the loop, waits for SIGINT/SIGTERM/SIGQUIT (Ctrl-C elsewhere), then stops.
    pub async fn run_until_signal(&self) -> Result<(), RuntimeError> {
        self.start().await?;
        if let Err(err) = shutdown::termination().await {
            let _ = self.stop().await;
            return Err(err.into());
        }
        self.stop().await
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.run.get_mut().take() {
            handle.token.cancel();
        }
        self.listener.cancel();
    }
}
