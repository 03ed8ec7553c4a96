// src/cleanup/signal.rs

use anyhow::{Context, Result};

/// Wait for the first shutdown signal and return its name.
///
/// Unix: `SIGINT`, `SIGTERM`, `SIGHUP`. Elsewhere: Ctrl-C.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> Result<String> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt()).context("installing SIGINT handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("installing SIGTERM handler")?;
    let mut hangup = signal(SignalKind::hangup()).context("installing SIGHUP handler")?;

    let name = tokio::select! {
        _ = interrupt.recv() => "SIGINT",
        _ = terminate.recv() => "SIGTERM",
        _ = hangup.recv() => "SIGHUP",
    };
    Ok(name.to_string())
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> Result<String> {
    tokio::signal::ctrl_c()
        .await
        .context("listening for Ctrl+C")?;
    Ok("Ctrl+C".to_string())
}
