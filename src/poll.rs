// src/poll.rs

//! Fixed-interval polling for external conditions.
//!
//! Both handshake waits (artifact file, activation status) are "check, sleep,
//! check again" loops with no backoff growth. They sleep on `tokio::time`, so
//! tests run them under a paused clock, and they are cancelled simply by
//! dropping the future (which is what happens when a shutdown signal wins
//! the `select!` in `lib.rs`).

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::errors::{Result, SupervisorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    pub interval: Duration,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
}

/// Call `check` until it yields `Some`, sleeping `interval` between calls.
///
/// The first check happens immediately. `check` receives the 1-based attempt
/// number. With a timeout, the loop gives up with
/// [`SupervisorError::HandshakeTimedOut`] once the elapsed time reaches it;
/// the final sleep is shortened so that never overshoots the limit.
pub async fn poll_until<T, F, Fut>(what: &str, options: PollOptions, mut check: F) -> Result<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;
        if let Some(value) = check(attempt).await {
            debug!(what, attempt, elapsed = ?started.elapsed(), "poll condition met");
            return Ok(value);
        }

        let mut pause = options.interval;
        if let Some(limit) = options.timeout {
            let elapsed = started.elapsed();
            if elapsed >= limit {
                return Err(SupervisorError::HandshakeTimedOut(limit));
            }
            // Last check lands exactly on the deadline.
            pause = pause.min(limit - elapsed);
        }

        debug!(what, attempt, ?pause, "condition not met; sleeping");
        sleep(pause).await;
    }
}
