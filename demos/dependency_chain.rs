//! # Example: dependency_chain
//!
//! A small desktop-automation flow: locate a button, click it, then type into
//! the field that appears. Each step depends on the previous one, so the
//! scheduler holds the later steps back even though `type-text` is submitted
//! with a higher priority.
//!
//! ## Flow
//! ```text
//! submit(locate, Normal)
//! submit(click,  Normal, depends_on=locate)
//! submit(type,   Urgent, depends_on=click)
//!
//! dispatcher
//!   ├─► pop type   → gate: Waiting → DependencyBlocked, re-check later
//!   ├─► pop locate → TaskStarting → TaskCompleted {"x":412,"y":96}
//!   ├─► pop click  → TaskStarting → TaskCompleted
//!   └─► pop type   → TaskStarting → TaskCompleted
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example dependency_chain
//! ```

use std::time::Duration;

use serde_json::json;
use taskdeck::{AttemptContext, BlockingFn, Config, ExecFn, Priority, Scheduler, TaskError};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Two workers, quick dependency re-checks
    let mut cfg = Config::default();
    cfg.max_workers = 2;
    cfg.dependency_recheck = Duration::from_millis(50);
    cfg.poll_interval = Duration::from_millis(100);

    let sched = Scheduler::new(cfg);

    // 2. Print the lifecycle as it happens
    let mut events = sched.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            let task = ev.task.as_deref().unwrap_or("-");
            println!("[event] {:?} task={task} attempt={:?}", ev.kind, ev.attempt);
        }
    });

    // 3. Steps
    let locate = ExecFn::arc("locate", |ctx: AttemptContext| async move {
        ctx.checkpoint()?;
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok::<_, TaskError>(Some(json!({ "x": 412, "y": 96 })))
    });
    let click = ExecFn::arc("click", |_ctx: AttemptContext| async move {
        println!("[click] pressing the button");
        Ok::<_, TaskError>(None)
    });
    let type_text = BlockingFn::arc("type-text", |ctx: &AttemptContext| {
        for ch in "hello".chars() {
            ctx.checkpoint()?;
            println!("[type-text] key {ch}");
            std::thread::sleep(Duration::from_millis(20));
        }
        Ok(Some(json!({ "typed": 5 })))
    });

    let locate = sched.submit(sched.spec(locate).with_name("find-button")).await;
    let click = sched
        .submit(sched.spec(click).with_name("press-button").depends_on(locate))
        .await;
    let typed = sched
        .submit(
            sched
                .spec(type_text)
                .with_name("fill-field")
                .with_priority(Priority::Urgent)
                .depends_on(click),
        )
        .await;

    // 4. Run until the last step settles
    sched.start().await?;
    let status = sched.wait(typed, Duration::from_secs(10)).await?;
    println!("[main] fill-field finished: {status}");

    if let Some(res) = sched.result(locate).await {
        println!("[main] find-button data: {:?}", res.data);
    }
    println!("[main] stats: {:?}", sched.stats().await);

    sched.stop().await?;
    printer.abort();
    Ok(())
}
