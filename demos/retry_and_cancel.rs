//! # Example: retry_and_cancel
//!
//! Two tasks side by side:
//! - `flaky` fails twice and succeeds on its third attempt, with exponential
//!   backoff and jitter between attempts;
//! - `watch-dialog` waits for a dialog that never shows up and is cancelled
//!   from `main` while it is running.
//!
//! ## Flow
//! ```text
//! flaky
//!   ├─► attempt 1 → Err("image not found") → RetryScheduled{≈100ms}
//!   ├─► attempt 2 → Err("image not found") → RetryScheduled{≈200ms}
//!   └─► attempt 3 → Ok                     → TaskCompleted
//!
//! watch-dialog
//!   ├─► attempt 1 → waits on ctx.cancelled()
//!   ├─► cancel(id)  → TaskCancelled
//!   └─► executor returns Canceled → outcome dropped, no retry
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example retry_and_cancel
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use taskdeck::{
    AttemptContext, BackoffPolicy, Config, EventKind, ExecFn, JitterPolicy, Scheduler, TaskError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Runtime defaults
    let mut cfg = Config::default();
    cfg.max_workers = 2;
    cfg.poll_interval = Duration::from_millis(100);
    let sched = Scheduler::new(cfg);

    // 2. Only retry and terminal events are interesting here
    let mut events = sched.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            let task = ev.task.as_deref().unwrap_or("-");
            match ev.kind {
                EventKind::AttemptFailed => {
                    println!("[event] {task} attempt {:?} failed: {:?}", ev.attempt, ev.reason);
                }
                EventKind::RetryScheduled => {
                    println!("[event] {task} retry in {:?}ms", ev.delay_ms);
                }
                kind if ev.is_terminal() => println!("[event] {task} {kind:?}"),
                _ => {}
            }
        }
    });

    // 3. A task that needs three attempts
    let tries = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&tries);
    let flaky = ExecFn::arc("flaky", move |ctx: AttemptContext| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::Relaxed);
            if ctx.attempt() <= 2 {
                return Err(TaskError::fail("image not found"));
            }
            Ok(None)
        }
    });
    let backoff = BackoffPolicy::exponential(Duration::from_millis(100), 2.0, Duration::from_secs(2))
        .with_jitter(JitterPolicy::Equal);
    let flaky = sched
        .submit(sched.spec(flaky).with_max_retries(3).with_backoff(backoff))
        .await;

    // 4. A task that only ends when cancelled
    let watcher = ExecFn::arc("watch-dialog", |ctx: AttemptContext| async move {
        ctx.cancelled().await;
        println!("[watch-dialog] cancellation observed");
        Err::<Option<serde_json::Value>, _>(TaskError::Canceled)
    });
    let watcher = sched.submit(sched.spec(watcher).with_max_retries(5)).await;

    sched.start().await?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[main] cancelling watch-dialog: {}", sched.cancel(watcher).await);

    let status = sched.wait(flaky, Duration::from_secs(10)).await?;
    println!(
        "[main] flaky finished: {status} after {} attempts",
        tries.load(Ordering::Relaxed)
    );
    println!("[main] watch-dialog: {:?}", sched.status(watcher).await);

    sched.stop().await?;
    printer.abort();
    Ok(())
}
