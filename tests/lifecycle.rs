mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use taskdeck::{
    AttemptContext, BlockingFn, Event, EventKind, ExecFn, RuntimeError, Scheduler, Subscribe, TaskError,
    TaskId, TaskStatus,
};
use tokio::sync::Notify;

use common::{SETTLE, always_fail, config, succeed};

#[tokio::test]
async fn always_failing_task_retries_exactly_max_retries_times() -> Result<()> {
    let sched = Scheduler::new(config(2));
    let mut events = sched.subscribe();
    let attempts = Arc::new(AtomicU32::new(0));

    let id = sched
        .submit(sched.spec(always_fail("nope", attempts.clone())).with_max_retries(3))
        .await;

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Failed);
    sched.stop().await?;

    let res = sched.result(id).await.expect("result");
    assert!(!res.success);
    assert_eq!(res.retry_count, 3);
    assert_eq!(res.error.as_deref(), Some("nope"));
    assert_eq!(attempts.load(Ordering::SeqCst), 4);

    let mut retries = 0;
    let mut failed_attempts = 0;
    while let Ok(ev) = events.try_recv() {
        if ev.task_id != Some(id) {
            continue;
        }
        match ev.kind {
            EventKind::RetryScheduled => retries += 1,
            EventKind::AttemptFailed => failed_attempts += 1,
            _ => {}
        }
    }
    assert_eq!(retries, 3);
    assert_eq!(failed_attempts, 4);
    Ok(())
}

#[tokio::test]
async fn zero_delay_retries_end_in_failure_with_last_error() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let id = sched
        .submit(
            sched
                .spec(always_fail("x", Arc::new(AtomicU32::new(0))))
                .with_max_retries(2)
                .with_retry_delay(Duration::ZERO),
        )
        .await;

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Failed);
    sched.stop().await?;

    let res = sched.result(id).await.expect("result");
    assert_eq!(res.error.as_deref(), Some("x"));
    assert_eq!(res.retry_count, 2);
    Ok(())
}

#[tokio::test]
async fn timeout_counts_as_a_failed_attempt() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let slow = ExecFn::arc("slow", move |_ctx: AttemptContext| {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, TaskError>(None)
        }
    });
    let id = sched
        .submit(
            sched
                .spec(slow)
                .with_timeout(Duration::from_millis(20))
                .with_max_retries(1),
        )
        .await;

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Failed);
    sched.stop().await?;

    let res = sched.result(id).await.expect("result");
    assert_eq!(res.error.as_deref(), Some("timed out after 20ms"));
    assert_eq!(res.retry_count, 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    Ok(())
}

#[tokio::test]
async fn panicking_executor_is_contained() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let boom = ExecFn::arc("boom", |ctx: AttemptContext| async move {
        if ctx.attempt() > 0 {
            panic!("device unplugged");
        }
        Ok::<_, TaskError>(None)
    });
    let id = sched.submit(sched.spec(boom).with_max_retries(0)).await;
    let after = sched.submit(sched.spec(succeed())).await;

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Failed);
    assert_eq!(sched.wait(after, SETTLE).await?, TaskStatus::Completed);
    sched.stop().await?;

    let err = sched.result(id).await.and_then(|r| r.error).unwrap_or_default();
    assert_eq!(err, "executor panicked: device unplugged");
    Ok(())
}

#[tokio::test]
async fn cancel_before_dispatch_never_runs() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let attempts = Arc::new(AtomicU32::new(0));
    let id = sched
        .submit(sched.spec(always_fail("never", attempts.clone())))
        .await;

    assert!(sched.cancel(id).await);
    assert!(!sched.cancel(id).await);

    sched.start().await?;
    tokio::time::sleep(Duration::from_millis(50)).await;
    sched.stop().await?;

    let info = sched.info(id).await.expect("known");
    assert_eq!(info.status, TaskStatus::Cancelled);
    assert!(info.cancel_requested);
    assert!(info.started_at.is_none());
    assert!(info.completed_at.is_some());
    assert!(info.result.is_none());
    assert_eq!(attempts.load(Ordering::SeqCst), 0);
    Ok(())
}

#[tokio::test]
async fn cancel_while_running_is_terminal_and_not_retried() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let started = Arc::new(Notify::new());
    let attempts = Arc::new(AtomicU32::new(0));

    let (signal, counter) = (started.clone(), attempts.clone());
    let waiter = ExecFn::arc("wait-for-window", move |ctx: AttemptContext| {
        let (signal, counter) = (signal.clone(), counter.clone());
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            signal.notify_one();
            ctx.cancelled().await;
            Err::<Option<serde_json::Value>, _>(TaskError::Canceled)
        }
    });
    let id = sched.submit(sched.spec(waiter).with_max_retries(5)).await;

    sched.start().await?;
    tokio::time::timeout(SETTLE, started.notified()).await?;
    assert_eq!(sched.status(id).await, Some(TaskStatus::Running));

    assert!(sched.cancel(id).await);
    assert_eq!(sched.status(id).await, Some(TaskStatus::Cancelled));
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Cancelled);

    tokio::time::sleep(Duration::from_millis(50)).await;
    sched.stop().await?;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    assert_eq!(sched.status(id).await, Some(TaskStatus::Cancelled));
    assert!(!sched.cancel(id).await);
    Ok(())
}

#[tokio::test]
async fn cancel_during_retry_delay_stops_further_attempts() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let attempts = Arc::new(AtomicU32::new(0));
    let id = sched
        .submit(
            sched
                .spec(always_fail("flaky", attempts.clone()))
                .with_max_retries(3)
                .with_retry_delay(Duration::from_millis(150)),
        )
        .await;

    sched.start().await?;
    let deadline = tokio::time::Instant::now() + SETTLE;
    while sched.status(id).await != Some(TaskStatus::Retrying) {
        assert!(tokio::time::Instant::now() < deadline, "never reached RETRYING");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    assert!(sched.cancel(id).await);
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Cancelled);

    // Outlast the retry timer; its re-enqueue must not revive the task.
    tokio::time::sleep(Duration::from_millis(300)).await;
    sched.stop().await?;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let info = sched.info(id).await.expect("known task");
    assert_eq!(info.status, TaskStatus::Cancelled);
    assert!(info.cancel_requested);
    assert!(info.result.is_none());
    assert_eq!(sched.stats().await.pending, 0);
    Ok(())
}

#[tokio::test]
async fn late_failure_after_cancel_is_not_retried() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let started = Arc::new(Notify::new());
    let attempts = Arc::new(AtomicU32::new(0));

    let (signal, counter) = (started.clone(), attempts.clone());
    let deaf = ExecFn::arc("ignores-token", move |_ctx: AttemptContext| {
        let (signal, counter) = (signal.clone(), counter.clone());
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            signal.notify_one();
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err::<Option<serde_json::Value>, _>(TaskError::fail("window gone"))
        }
    });
    let id = sched.submit(sched.spec(deaf).with_max_retries(5)).await;

    sched.start().await?;
    tokio::time::timeout(SETTLE, started.notified()).await?;
    assert!(sched.cancel(id).await);

    // Let the executor finish and report its failure.
    tokio::time::sleep(Duration::from_millis(250)).await;
    sched.stop().await?;

    assert_eq!(attempts.load(Ordering::SeqCst), 1);
    let info = sched.info(id).await.expect("known task");
    assert_eq!(info.status, TaskStatus::Cancelled);
    assert_eq!(info.retry_count, 0);
    assert!(info.result.is_none());
    Ok(())
}

#[tokio::test]
async fn timed_out_blocking_attempts_never_overlap() -> Result<()> {
    let sched = Scheduler::new(config(2));
    let live = Arc::new(AtomicU32::new(0));
    let peak = Arc::new(AtomicU32::new(0));
    let attempts = Arc::new(AtomicU32::new(0));

    let (l, p, n) = (live.clone(), peak.clone(), attempts.clone());
    let stubborn = BlockingFn::arc("stubborn", move |_ctx: &AttemptContext| {
        n.fetch_add(1, Ordering::SeqCst);
        let now = l.fetch_add(1, Ordering::SeqCst) + 1;
        p.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(120));
        l.fetch_sub(1, Ordering::SeqCst);
        Ok(None)
    });
    let id = sched
        .submit(
            sched
                .spec(stubborn)
                .with_timeout(Duration::from_millis(30))
                .with_max_retries(2),
        )
        .await;

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Failed);

    assert_eq!(live.load(Ordering::SeqCst), 0, "attempt still running after FAILED");
    assert_eq!(peak.load(Ordering::SeqCst), 1);
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
    sched.stop().await?;

    let res = sched.result(id).await.expect("result");
    assert_eq!(res.error.as_deref(), Some("timed out after 30ms"));
    assert_eq!(res.retry_count, 2);
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_reported() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let ghost = TaskId::new();

    assert_eq!(sched.status(ghost).await, None);
    assert!(sched.result(ghost).await.is_none());
    assert!(sched.info(ghost).await.is_none());
    assert!(!sched.cancel(ghost).await);

    let err = sched.wait(ghost, SETTLE).await.unwrap_err();
    assert!(matches!(err, RuntimeError::UnknownTask { id } if id == ghost));
    Ok(())
}

#[tokio::test]
async fn stats_count_every_partition() -> Result<()> {
    let sched = Scheduler::new(config(2));

    let ok = sched.submit(sched.spec(succeed())).await;
    let bad = sched
        .submit(sched.spec(always_fail("x", Arc::new(AtomicU32::new(0)))).with_max_retries(0))
        .await;
    let gone = sched.submit(sched.spec(succeed()).depends_on(TaskId::new())).await;
    let _blocked = sched.submit(sched.spec(succeed()).depends_on(TaskId::new())).await;
    assert!(sched.cancel(gone).await);

    sched.start().await?;
    sched.wait(ok, SETTLE).await?;
    sched.wait(bad, SETTLE).await?;
    sched.stop().await?;

    let stats = sched.stats().await;
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.running + stats.retrying, 0);
    assert_eq!(stats.total, 4);
    Ok(())
}

#[tokio::test]
async fn start_and_stop_are_guarded_and_restartable() -> Result<()> {
    let sched = Scheduler::new(config(1));

    assert!(matches!(sched.stop().await, Err(RuntimeError::NotRunning)));
    sched.start().await?;
    assert!(sched.is_running().await);
    assert!(matches!(sched.start().await, Err(RuntimeError::AlreadyRunning)));
    sched.stop().await?;
    assert!(!sched.is_running().await);

    let id = sched.submit(sched.spec(succeed())).await;
    tokio::time::sleep(Duration::from_millis(30)).await;
    assert_eq!(sched.status(id).await, Some(TaskStatus::Pending));

    sched.start().await?;
    assert_eq!(sched.wait(id, SETTLE).await?, TaskStatus::Completed);
    sched.stop().await?;
    Ok(())
}

#[tokio::test]
async fn stop_requeues_pending_retries_immediately() -> Result<()> {
    let sched = Scheduler::new(config(1));
    let id = sched
        .submit(
            sched
                .spec(always_fail("later", Arc::new(AtomicU32::new(0))))
                .with_max_retries(1)
                .with_retry_delay(Duration::from_secs(60)),
        )
        .await;

    sched.start().await?;
    let deadline = tokio::time::Instant::now() + SETTLE;
    while sched.status(id).await != Some(TaskStatus::Retrying) {
        assert!(tokio::time::Instant::now() < deadline, "never reached RETRYING");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    sched.stop().await?;
    let deadline = tokio::time::Instant::now() + SETTLE;
    while sched.status(id).await != Some(TaskStatus::Pending) {
        assert!(tokio::time::Instant::now() < deadline, "retry stranded after stop");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(sched.info(id).await.unwrap().retry_count, 1);
    Ok(())
}

#[tokio::test]
async fn stop_aborts_attempts_that_outlive_grace() -> Result<()> {
    let mut cfg = config(1);
    cfg.grace = Duration::from_millis(50);
    let sched = Scheduler::new(cfg);
    let started = Arc::new(Notify::new());

    let signal = started.clone();
    let stubborn = ExecFn::arc("stubborn", move |_ctx: AttemptContext| {
        let signal = signal.clone();
        async move {
            signal.notify_one();
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, TaskError>(None)
        }
    });
    let id = sched
        .submit(sched.spec(stubborn).with_name("stubborn").with_max_retries(0))
        .await;

    sched.start().await?;
    tokio::time::timeout(SETTLE, started.notified()).await?;

    match sched.stop().await {
        Err(RuntimeError::GraceExceeded { stuck, .. }) => assert_eq!(stuck, vec!["stubborn"]),
        other => panic!("expected GraceExceeded, got {other:?}"),
    }

    let res = sched.result(id).await.expect("aborted attempt recorded");
    assert_eq!(sched.status(id).await, Some(TaskStatus::Failed));
    assert_eq!(res.error.as_deref(), Some("attempt aborted: shutdown grace exceeded"));
    Ok(())
}

#[derive(Default)]
struct Recorder(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Recorder {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "recorder"
    }
}

#[tokio::test]
async fn subscribers_observe_the_task_lifecycle() -> Result<()> {
    let recorder = Arc::new(Recorder::default());
    let sched = Scheduler::builder(config(1))
        .with_subscriber(recorder.clone())
        .build();

    let id = sched.submit(sched.spec(succeed())).await;
    sched.start().await?;
    sched.wait(id, SETTLE).await?;
    sched.stop().await?;

    let deadline = tokio::time::Instant::now() + SETTLE;
    loop {
        let seen = recorder.0.lock().unwrap().clone();
        if seen.contains(&EventKind::AllStoppedWithin) {
            let pos = |k| seen.iter().position(|e| *e == k);
            assert!(pos(EventKind::TaskSubmitted) < pos(EventKind::TaskStarting));
            assert!(pos(EventKind::TaskStarting) < pos(EventKind::TaskCompleted));
            break;
        }
        assert!(tokio::time::Instant::now() < deadline, "events never delivered: {seen:?}");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    Ok(())
}
