//! # Task specification for submission.
//!
//! [`TaskSpec`] bundles an [`Executor`](crate::Executor) with everything the scheduler
//! needs to run it: name, priority, per-attempt timeout, retry policy and
//! prerequisite task ids. The id is generated here, before submission, so a
//! caller can wire dependencies between specs it has not submitted yet.
//!
//! A spec can be created:
//! - **Explicitly** with [`TaskSpec::new`] (built-in defaults) and the `with_*` setters
//! - **From config** with [`TaskSpec::with_defaults`] (inherit timeout and retries)
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use taskdeck::{AttemptContext, Config, ExecFn, Priority, TaskError, TaskSpec};
//!
//! let exec = ExecFn::arc("noop", |_ctx: AttemptContext| async { Ok::<_, TaskError>(None) });
//!
//! let login = TaskSpec::new(exec.clone()).with_name("login").with_priority(Priority::High);
//! let farm = TaskSpec::with_defaults(exec, &Config::default())
//!     .with_name("farm")
//!     .depends_on(login.id())
//!     .with_max_retries(5)
//!     .with_retry_delay(Duration::from_millis(500));
//!
//! assert_eq!(farm.dependencies(), &[login.id()]);
//! assert_eq!(farm.timeout(), Some(Duration::from_secs(30)));
//! ```

use std::time::Duration;

use crate::{
    config::Config,
    policies::{BackoffPolicy, RetryPolicy},
    tasks::{ExecutorRef, Priority, TaskId},
};

/// Everything needed to submit one task.
#[derive(Clone)]
pub struct TaskSpec {
    id: TaskId,
    name: Option<String>,
    priority: Priority,
    timeout: Option<Duration>,
    retry: RetryPolicy,
    dependencies: Vec<TaskId>,
    executor: ExecutorRef,
}

impl TaskSpec {
    /// Creates a spec with a fresh id and built-in defaults
    /// (`Normal` priority, 30s timeout, 3 retries one second apart).
    pub fn new(executor: ExecutorRef) -> Self {
        Self {
            id: TaskId::new(),
            name: None,
            priority: Priority::Normal,
            timeout: Some(Duration::from_secs(30)),
            retry: RetryPolicy::default(),
            dependencies: Vec::new(),
            executor,
        }
    }

    /// Creates a spec inheriting timeout and retry defaults from `cfg`.
    ///
    /// Uses `Config::default_timeout()` so that `0s` in config means no timeout.
    pub fn with_defaults(executor: ExecutorRef, cfg: &Config) -> Self {
        Self {
            timeout: cfg.default_timeout(),
            retry: cfg.default_retry(),
            ..Self::new(executor)
        }
    }

    /// Pre-generated task id.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Display name; `task-<id prefix>` when none was set.
    pub fn name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("task-{}", self.id.short()))
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    pub fn dependencies(&self) -> &[TaskId] {
        &self.dependencies
    }

    pub fn executor(&self) -> &ExecutorRef {
        &self.executor
    }

    /// Sets the display name (empty names fall back to the default).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.name = if name.is_empty() { None } else { Some(name) };
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the per-attempt timeout; `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (timeout > Duration::ZERO).then_some(timeout);
        self
    }

    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    /// Constant delay between a failure and the re-enqueue.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.backoff = BackoffPolicy::constant(delay);
        self
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.retry.backoff = backoff;
        self
    }

    /// Adds one prerequisite; duplicates are ignored.
    pub fn depends_on(mut self, id: TaskId) -> Self {
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self
    }

    /// Adds several prerequisites.
    pub fn depends_on_all(self, ids: impl IntoIterator<Item = TaskId>) -> Self {
        ids.into_iter().fold(self, TaskSpec::depends_on)
    }
}
