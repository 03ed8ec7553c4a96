// src/supervisor/session.rs

use std::time::Duration;

/// Retry bookkeeping for one supervisor run. Only the core mutates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub retry_count: u32,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Session {
    pub const DEFAULT_MAX_RETRIES: u32 = 10;
    pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(120);

    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            retry_count: 0,
            max_retries,
            retry_delay,
        }
    }

    /// 1-based number of the attempt currently running or about to run.
    pub fn current_attempt(&self) -> u32 {
        self.retry_count + 1
    }

    pub fn is_exhausted(&self) -> bool {
        self.retry_count >= self.max_retries
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_RETRY_DELAY)
    }
}
