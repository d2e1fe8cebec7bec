//! # Termination signals for [`Scheduler::run_until_signal`](crate::Scheduler::run_until_signal).
//!
//! Unix: `SIGINT` (via `ctrl_c`), `SIGTERM`, `SIGQUIT`. Elsewhere: Ctrl-C only.
//! Listeners are installed per call and dropped when it returns.

#[cfg(unix)]
pub(crate) async fn termination() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = term.recv() => Ok(()),
        _ = quit.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
pub(crate) async fn termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
