// src/supervisor/runtime.rs

use std::fmt;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::errors::{Result, SupervisorError};
use crate::lock::LockRelease;
use crate::worker::{LaunchPlan, WorkerBackend};

use super::core::{AttemptOutcome, SupervisorCommand, SupervisorCore, SupervisorEvent, SupervisorOutcome};
use super::session::Session;

/// Drives [`SupervisorCore`] and carries out its commands: release the
/// identity lock, launch the worker, sleep between attempts.
pub struct RetrySupervisor<L: LockRelease, W: WorkerBackend> {
    core: SupervisorCore,
    lock: L,
    worker: W,
    plan: LaunchPlan,
}

impl<L: LockRelease, W: WorkerBackend> fmt::Debug for RetrySupervisor<L, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySupervisor")
            .field("core", &self.core)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl<L: LockRelease, W: WorkerBackend> RetrySupervisor<L, W> {
    pub fn new(session: Session, lock: L, worker: W, plan: LaunchPlan) -> Self {
        Self {
            core: SupervisorCore::new(session),
            lock,
            worker,
            plan,
        }
    }

    /// Run attempts until one succeeds or the retry budget is spent.
    ///
    /// Exhaustion is returned as [`SupervisorError::RetriesExhausted`].
    pub async fn run(mut self) -> Result<SupervisorOutcome> {
        info!(
            max_retries = self.core.session().max_retries,
            retry_delay = ?self.core.session().retry_delay,
            mode = %self.plan.mode(),
            "retry supervisor started"
        );

        let mut next = self.core.step(SupervisorEvent::Start);

        while let Some(command) = next {
            next = match command {
                SupervisorCommand::StartAttempt { attempt } => {
                    let outcome = self.run_attempt(attempt).await;
                    self.core.step(SupervisorEvent::AttemptFinished(outcome))
                }
                SupervisorCommand::Backoff(delay) => {
                    info!(
                        retry_count = self.core.session().retry_count,
                        max_retries = self.core.session().max_retries,
                        ?delay,
                        "worker failed; retrying after delay"
                    );
                    sleep(delay).await;
                    self.core.step(SupervisorEvent::BackoffElapsed)
                }
                SupervisorCommand::Finish(outcome) => {
                    return match outcome {
                        SupervisorOutcome::Succeeded { attempts } => {
                            info!(attempts, "worker finished successfully");
                            Ok(outcome)
                        }
                        SupervisorOutcome::Exhausted { attempts } => {
                            Err(SupervisorError::RetriesExhausted { attempts })
                        }
                    };
                }
            };
        }

        Err(SupervisorError::Other(anyhow::anyhow!(
            "supervisor stopped in state {:?} without an outcome",
            self.core.state()
        )))
    }

    async fn run_attempt(&mut self, attempt: u32) -> AttemptOutcome {
        info!(attempt, "starting attempt");

        self.lock.release(&self.plan.identity).await;

        let invocation = self.plan.invocation();
        match self.worker.launch(invocation).await {
            Ok(exit) if exit.is_success() => AttemptOutcome::Success,
            Ok(exit) => {
                warn!(attempt, ?exit, "worker exited with failure");
                AttemptOutcome::Failure
            }
            Err(e) => {
                warn!(attempt, error = %e, "worker could not be launched");
                AttemptOutcome::Failure
            }
        }
    }
}
