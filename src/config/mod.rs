// src/config/mod.rs

//! Configuration loading and validation for swarm-supervisor.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk and apply environment overrides (`loader.rs`).
//! - Validate durations and URLs into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_env_overrides, load_and_validate, load_from_path, load_or_default};
pub use model::{
    AuthSettings, ConfigFile, LockSettings, RawConfigFile, SupervisorSettings, WorkerSettings,
};
