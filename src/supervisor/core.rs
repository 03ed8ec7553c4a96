// src/supervisor/core.rs

//! Pure retry state machine.
//!
//! Consumes [`SupervisorEvent`]s and returns the [`SupervisorCommand`] the
//! async shell (`supervisor::runtime::RetrySupervisor`) should carry out.
//! No tokio, no processes, no clocks: unit tested directly.

use std::time::Duration;

use tracing::{debug, warn};

use super::session::Session;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Attempting,
    Retrying,
    Succeeded,
    Exhausted,
}

impl SupervisorState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SupervisorState::Succeeded | SupervisorState::Exhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// Session start.
    Start,
    /// The worker of the current attempt exited (or never started).
    AttemptFinished(AttemptOutcome),
    /// The backoff sleep is over.
    BackoffElapsed,
}

/// Final result of a supervisor run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorOutcome {
    Succeeded { attempts: u32 },
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCommand {
    /// Release the identity lock, then launch a fresh worker.
    StartAttempt { attempt: u32 },
    /// Sleep before the next attempt.
    Backoff(Duration),
    /// Stop; nothing more to do.
    Finish(SupervisorOutcome),
}

#[derive(Debug)]
pub struct SupervisorCore {
    session: Session,
    state: SupervisorState,
}

impl SupervisorCore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            state: SupervisorState::Idle,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Feed one event. Returns `None` when the event doesn't apply to the
    /// current state (it is ignored).
    pub fn step(&mut self, event: SupervisorEvent) -> Option<SupervisorCommand> {
        let command = match (self.state, event) {
            (SupervisorState::Idle, SupervisorEvent::Start) => {
                self.session.retry_count = 0;
                self.state = SupervisorState::Attempting;
                SupervisorCommand::StartAttempt {
                    attempt: self.session.current_attempt(),
                }
            }
            (SupervisorState::Attempting, SupervisorEvent::AttemptFinished(outcome)) => {
                self.on_attempt_finished(outcome)
            }
            (SupervisorState::Retrying, SupervisorEvent::BackoffElapsed) => {
                self.state = SupervisorState::Attempting;
                SupervisorCommand::StartAttempt {
                    attempt: self.session.current_attempt(),
                }
            }
            (state, event) => {
                warn!(?state, ?event, "ignoring event not valid in current state");
                return None;
            }
        };

        debug!(state = ?self.state, retry_count = self.session.retry_count, ?command, "supervisor step");
        Some(command)
    }

    fn on_attempt_finished(&mut self, outcome: AttemptOutcome) -> SupervisorCommand {
        match outcome {
            AttemptOutcome::Success => {
                self.state = SupervisorState::Succeeded;
                SupervisorCommand::Finish(SupervisorOutcome::Succeeded {
                    attempts: self.session.current_attempt(),
                })
            }
            AttemptOutcome::Failure => {
                self.session.retry_count += 1;
                if self.session.is_exhausted() {
                    self.state = SupervisorState::Exhausted;
                    SupervisorCommand::Finish(SupervisorOutcome::Exhausted {
                        attempts: self.session.retry_count,
                    })
                } else {
                    self.state = SupervisorState::Retrying;
                    SupervisorCommand::Backoff(self.session.retry_delay)
                }
            }
        }
    }
}
