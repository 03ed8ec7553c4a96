// src/supervisor/mod.rs

//! Retry supervisor.
//!
//! `Idle → Attempting → {Succeeded, Retrying → Attempting, Exhausted}`.
//!
//! The state machine lives in [`core`]; [`runtime`] is the async shell that
//! releases the identity lock, launches workers and sleeps between attempts.

pub mod core;
pub mod runtime;
pub mod session;

pub use self::core::{
    AttemptOutcome, SupervisorCommand, SupervisorCore, SupervisorEvent, SupervisorOutcome,
    SupervisorState,
};
pub use runtime::RetrySupervisor;
pub use session::Session;
