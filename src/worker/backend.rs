// src/worker/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The retry supervisor talks to a `WorkerBackend` instead of spawning
//! processes itself, so tests can script exit statuses without running
//! anything.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::info;

use crate::config::WorkerSettings;
use crate::errors::{Result, SupervisorError};

use super::invocation::WorkerInvocation;

/// How a worker process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    Success,
    Failed(i32),
    /// Killed by a signal (unix only).
    Signaled(i32),
}

impl WorkerExit {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkerExit::Success)
    }
}

impl From<ExitStatus> for WorkerExit {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return WorkerExit::Success;
        }
        if let Some(code) = status.code() {
            return WorkerExit::Failed(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return WorkerExit::Signaled(signal);
            }
        }
        WorkerExit::Failed(-1)
    }
}

/// Trait abstracting how a worker is run.
pub trait WorkerBackend: Send {
    /// Start the worker and wait for it to exit.
    ///
    /// An `Err` means the worker could not be started at all; the supervisor
    /// treats it like a failed attempt.
    fn launch(
        &mut self,
        invocation: WorkerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerExit>> + Send + '_>>;
}

/// Runs the worker as a foreground child process.
///
/// stdio is inherited and the child stays in our process group, so terminal
/// interrupts and the exit handler's group signal reach it directly.
#[derive(Debug, Clone)]
pub struct ProcessWorkerBackend {
    program: String,
    base_args: Vec<String>,
    env: Vec<(String, String)>,
}

impl ProcessWorkerBackend {
    pub fn new(settings: &WorkerSettings, env: Vec<(String, String)>) -> Self {
        Self {
            program: settings.program.clone(),
            base_args: settings.args.clone(),
            env,
        }
    }

    /// Full argument vector for `invocation` (without the program).
    pub fn command_args(&self, invocation: &WorkerInvocation) -> Vec<String> {
        let mut args = self.base_args.clone();
        args.extend(invocation.to_args());
        args
    }
}

impl WorkerBackend for ProcessWorkerBackend {
    fn launch(
        &mut self,
        invocation: WorkerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerExit>> + Send + '_>> {
        Box::pin(async move {
            let args = self.command_args(&invocation);
            info!(
                program = %self.program,
                mode = %invocation.mode,
                args = ?args,
                "starting worker process"
            );

            let mut child = Command::new(&self.program)
                .args(&args)
                .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .stdin(Stdio::inherit())
                .stdout(Stdio::inherit())
                .stderr(Stdio::inherit())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| {
                    SupervisorError::WorkerLaunchFailure(format!(
                        "spawning '{}': {}",
                        self.program, e
                    ))
                })?;

            let status = child.wait().await.map_err(|e| {
                SupervisorError::WorkerLaunchFailure(format!("waiting for worker: {}", e))
            })?;

            let exit = WorkerExit::from(status);
            info!(?exit, "worker process exited");
            Ok(exit)
        })
    }
}
