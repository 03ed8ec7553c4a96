// src/errors.rs

//! Crate-wide error type and helpers.

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Cleaning up stale holders of the identity file failed. Only ever logged.
    #[error("Lock cleanup error: {0}")]
    LockCleanup(String),

    #[error("Invalid credential artifact: {0}")]
    InvalidCredentialArtifact(String),

    #[error("Failed to start auth service: {0}")]
    AuthServiceLaunch(String),

    #[error("Auth handshake timed out after {0:?}")]
    HandshakeTimedOut(Duration),

    #[error("Worker launch failure: {0}")]
    WorkerLaunchFailure(String),

    #[error("Worker failed {attempts} times in a row; giving up")]
    RetriesExhausted { attempts: u32 },

    #[error("Interrupted by {0}")]
    SignalInterrupt(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SupervisorError {
    /// Process exit code reported when a session ends with this error.
    ///
    /// A signal-driven shutdown is a clean exit, everything else is a failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            SupervisorError::SignalInterrupt(_) => 0,
            _ => 1,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SupervisorError>;
