//! # Termination signals.
//!
//! Unix: `SIGINT`, `SIGTERM` and `SIGQUIT`. Elsewhere: Ctrl-C.

use std::future;

/// Completes on the first termination signal.
///
/// Listeners are registered per call. Registration errors are returned right
/// away.
#[cfg(unix)]
pub(crate) async fn termination() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
        _ = quit.recv() => {},
    }
    Ok(())
}

#[cfg(not(unix))]
pub(crate) async fn termination() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Like [`termination`], but never completes when signals are unavailable.
pub(crate) async fn termination_or_never() {
    if termination().await.is_err() {
        future::pending::<()>().await;
    }
}
