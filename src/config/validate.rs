// src/config/validate.rs

use std::time::Duration;

use crate::config::model::{
    AuthSettings, ConfigFile, LockSettings, RawAuthSection, RawConfigFile, RawLockSection,
    RawSupervisorSection, SupervisorSettings,
};
use crate::errors::{Result, SupervisorError};
use crate::types::parse_duration;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = SupervisorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        Ok(ConfigFile {
            supervisor: validate_supervisor(raw.supervisor)?,
            lock: validate_lock(raw.lock)?,
            auth: validate_auth(raw.auth)?,
            worker: raw.worker,
        })
    }
}

fn validate_supervisor(raw: RawSupervisorSection) -> Result<SupervisorSettings> {
    if raw.max_retries == 0 {
        return Err(SupervisorError::ConfigError(
            "[supervisor].max_retries must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(SupervisorSettings {
        max_retries: raw.max_retries,
        retry_delay: duration_field("supervisor", "retry_delay", &raw.retry_delay)?,
    })
}

fn validate_lock(raw: RawLockSection) -> Result<LockSettings> {
    if raw.identity_path.as_os_str().is_empty() {
        return Err(SupervisorError::ConfigError(
            "[lock].identity_path must not be empty".to_string(),
        ));
    }

    Ok(LockSettings {
        settle_interval: duration_field("lock", "settle_interval", &raw.settle_interval)?,
        identity_path: raw.identity_path,
        process_name: raw.process_name,
    })
}

fn validate_auth(raw: RawAuthSection) -> Result<AuthSettings> {
    if !raw.url.starts_with("http://") && !raw.url.starts_with("https://") {
        return Err(SupervisorError::ConfigError(format!(
            "[auth].url must be an http(s) URL (got '{}')",
            raw.url
        )));
    }
    if raw.artifact_file.trim().is_empty() {
        return Err(SupervisorError::ConfigError(
            "[auth].artifact_file must not be empty".to_string(),
        ));
    }

    let poll_interval = duration_field("auth", "poll_interval", &raw.poll_interval)?;
    if poll_interval.is_zero() {
        return Err(SupervisorError::ConfigError(
            "[auth].poll_interval must be greater than zero".to_string(),
        ));
    }

    let timeout = raw
        .timeout
        .as_deref()
        .map(|s| duration_field("auth", "timeout", s))
        .transpose()?;

    Ok(AuthSettings {
        enabled: raw.enabled,
        service_program: raw.service_program,
        service_args: raw.service_args,
        service_dir: raw.service_dir,
        url: raw.url.trim_end_matches('/').to_string(),
        open_browser: raw.open_browser,
        artifact_dir: raw.artifact_dir,
        artifact_file: raw.artifact_file,
        poll_interval,
        timeout,
    })
}

fn duration_field(section: &str, key: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| {
        SupervisorError::ConfigError(format!("[{}].{}: {}", section, key, e))
    })
}
