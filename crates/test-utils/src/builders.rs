#![allow(dead_code)]

use std::path::PathBuf;

use swarm_supervisor::config::{AuthSettings, ConfigFile, RawConfigFile};
use swarm_supervisor::lock::IdentityResource;
use swarm_supervisor::worker::LaunchPlan;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.supervisor.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, delay: &str) -> Self {
        self.config.supervisor.retry_delay = delay.to_string();
        self
    }

    pub fn identity_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.lock.identity_path = path.into();
        self
    }

    pub fn artifact_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.auth.artifact_dir = dir.into();
        self
    }

    pub fn auth_timeout(mut self, timeout: &str) -> Self {
        self.config.auth.timeout = Some(timeout.to_string());
        self
    }

    pub fn org_id(mut self, org_id: &str) -> Self {
        self.config.worker.org_id = Some(org_id.to_string());
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Auth settings with defaults (5s polling, no timeout) and no browser.
pub fn auth_settings() -> AuthSettings {
    let mut auth = ConfigFileBuilder::new().build().auth;
    auth.open_browser = false;
    auth
}

/// A launch plan for the identity file at `identity`.
pub fn launch_plan(identity: impl Into<PathBuf>, org_id: Option<&str>) -> LaunchPlan {
    let cfg = ConfigFileBuilder::new().build();
    LaunchPlan {
        worker: cfg.worker,
        identity: IdentityResource::new(identity),
        org_id: org_id.map(str::to_string),
        config_path: PathBuf::from("configs/test.yaml"),
    }
}
