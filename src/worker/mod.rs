// src/worker/mod.rs

//! Worker launcher.
//!
//! - [`invocation`] builds the command line (org-id or peer-address mode).
//! - [`backend`] provides the [`WorkerBackend`] trait and the process-based
//!   [`ProcessWorkerBackend`] used in production.

pub mod backend;
pub mod invocation;

pub use backend::{ProcessWorkerBackend, WorkerBackend, WorkerExit};
pub use invocation::{LaunchPlan, WorkerInvocation};
