// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::types::parse_flag;

/// Environment variables that override config file values.
pub const ENV_IDENTITY_PATH: &str = "IDENTITY_PATH";
pub const ENV_PUBLIC_MADDR: &str = "PUB_MULTI_ADDRS";
pub const ENV_PEER_MADDR: &str = "PEER_MULTI_ADDRS";
pub const ENV_HOST_MADDR: &str = "HOST_MULTI_ADDRS";
pub const ENV_CPU_ONLY: &str = "CPU_ONLY";
pub const ENV_ORG_ID: &str = "ORG_ID";
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; durations and URLs are checked
/// by the `TryFrom<RawConfigFile>` conversion.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the raw config from an explicit path, or fall back to
/// [`default_config_path`] if it exists, or to built-in defaults.
///
/// An explicit path that does not exist is an error.
pub fn load_or_default(path: Option<&Path>) -> Result<RawConfigFile> {
    match path {
        Some(path) => load_from_path(path),
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                debug!(path = ?default_path, "loading default config file");
                load_from_path(default_path)
            } else {
                debug!("no config file found; using built-in defaults");
                Ok(RawConfigFile::default())
            }
        }
    }
}

/// Apply environment overrides on top of file values.
///
/// `lookup` is usually `|k| std::env::var(k).ok()`; tests pass a map.
/// Empty values are treated as unset.
pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_IDENTITY_PATH) {
        raw.lock.identity_path = PathBuf::from(v);
    }
    if let Some(v) = get(ENV_PUBLIC_MADDR) {
        raw.worker.public_maddr = v;
    }
    if let Some(v) = get(ENV_PEER_MADDR) {
        raw.worker.initial_peers = v;
    }
    if let Some(v) = get(ENV_HOST_MADDR) {
        raw.worker.host_maddr = v;
    }
    if let Some(v) = get(ENV_CPU_ONLY) {
        raw.worker.cpu_only = parse_flag(&v);
    }
    if let Some(v) = get(ENV_ORG_ID) {
        raw.worker.org_id = Some(v);
    }
    if let Some(v) = get(ENV_HF_TOKEN) {
        raw.worker.hf_token = v;
    }
}

/// Load a configuration file (or defaults), apply process environment
/// overrides and validate.
pub fn load_and_validate(path: Option<&Path>) -> Result<ConfigFile> {
    let mut raw_config = load_or_default(path)?;
    apply_env_overrides(&mut raw_config, |k| std::env::var(k).ok());
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Config file picked up from the working directory when `--config` is not
/// given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("swarm-supervisor.toml")
}
