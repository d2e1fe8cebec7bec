#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use taskdeck::{AttemptContext, BackoffPolicy, Config, ExecFn, ExecutorRef, TaskError};

pub const SETTLE: Duration = Duration::from_secs(5);

/// Fast pacing so tests do not sit on the default 1s poll / 1s retry delay.
pub fn config(workers: usize) -> Config {
    let mut cfg = Config::default();
    cfg.max_workers = workers;
    cfg.poll_interval = Duration::from_millis(10);
    cfg.dependency_recheck = Duration::from_millis(5);
    cfg.grace = Duration::from_secs(5);
    cfg.backoff = BackoffPolicy::constant(Duration::ZERO);
    cfg
}

/// Executor that succeeds and appends `label` to `log`.
pub fn record(label: &'static str, log: Arc<Mutex<Vec<&'static str>>>) -> ExecutorRef {
    ExecFn::arc("record", move |_ctx: AttemptContext| {
        let log = Arc::clone(&log);
        async move {
            log.lock().unwrap().push(label);
            Ok::<_, TaskError>(None)
        }
    })
}

/// Executor that fails every attempt with `error` and counts attempts.
pub fn always_fail(error: &'static str, attempts: Arc<AtomicU32>) -> ExecutorRef {
    ExecFn::arc("always-fail", move |_ctx: AttemptContext| {
        let attempts = Arc::clone(&attempts);
        async move {
            attempts.fetch_add(1, Ordering::SeqCst);
            Err::<Option<serde_json::Value>, _>(TaskError::fail(error))
        }
    })
}

pub fn succeed() -> ExecutorRef {
    ExecFn::arc("succeed", |_ctx: AttemptContext| async {
        Ok::<_, TaskError>(Some(serde_json::json!("done")))
    })
}
