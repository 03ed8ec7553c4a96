// src/auth/mod.rs

//! Auth handshake coordinator.
//!
//! Runs once per session, before any worker attempt:
//! 1. start the login service (detached),
//! 2. open the browser at its URL (best-effort),
//! 3. wait for the credential artifact to appear,
//! 4. parse the org id out of it,
//! 5. poll the status endpoint until the org id is activated.
//!
//! Both waits are unbounded unless `[auth].timeout` is configured.
//!
//! - [`artifact`] parses the org id and defines [`OrgCredential`].
//! - [`status`] provides the [`ActivationStatusSource`] trait and its HTTP client.
//! - [`service`] provides the [`AuthServiceLauncher`] trait and the process launcher.

pub mod artifact;
pub mod service;
pub mod status;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cleanup::ChildGroups;
use crate::config::AuthSettings;
use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;
use crate::poll::{PollOptions, poll_until};
use crate::types::ActivationStatus;

pub use artifact::{OrgCredential, parse_org_id};
pub use service::{AuthServiceLauncher, ProcessServiceLauncher};
pub use status::{ActivationStatusSource, HttpStatusClient};

pub struct HandshakeCoordinator {
    settings: AuthSettings,
    fs: Arc<dyn FileSystem>,
    launcher: Box<dyn AuthServiceLauncher>,
    status: Box<dyn ActivationStatusSource>,
}

impl HandshakeCoordinator {
    pub fn new(
        settings: AuthSettings,
        fs: Arc<dyn FileSystem>,
        launcher: Box<dyn AuthServiceLauncher>,
        status: Box<dyn ActivationStatusSource>,
    ) -> Self {
        Self {
            settings,
            fs,
            launcher,
            status,
        }
    }

    /// Production wiring: spawn the configured service (tracked in
    /// `children`), query it over HTTP.
    pub fn from_settings(
        settings: AuthSettings,
        fs: Arc<dyn FileSystem>,
        children: ChildGroups,
    ) -> Result<Self> {
        let launcher = ProcessServiceLauncher::from_settings(&settings, children);
        let status = HttpStatusClient::new(settings.url.clone())?;
        Ok(Self::new(settings, fs, Box::new(launcher), Box::new(status)))
    }

    fn poll_options(&self) -> PollOptions {
        PollOptions {
            interval: self.settings.poll_interval,
            timeout: self.settings.timeout,
        }
    }

    /// Block until an activated credential exists.
    pub async fn obtain_activated_credential(&self) -> Result<OrgCredential> {
        self.launcher
            .start()
            .map_err(|e| SupervisorError::AuthServiceLaunch(format!("{:#}", e)))?;

        if self.settings.open_browser {
            if let Err(e) = self.launcher.open_browser(&self.settings.url) {
                warn!(
                    url = %self.settings.url,
                    error = %e,
                    "could not open a browser; open the login page manually"
                );
            }
        }
        info!(url = %self.settings.url, "waiting for login to complete");

        let artifact_path = self.settings.artifact_path();
        self.wait_for_artifact(&artifact_path).await?;

        let contents = self.fs.read_to_string(&artifact_path).map_err(|e| {
            SupervisorError::InvalidCredentialArtifact(format!(
                "reading {:?}: {:#}",
                artifact_path, e
            ))
        })?;
        let credential = OrgCredential::pending(parse_org_id(&contents)?);
        info!(org_id = %credential.org_id, "credential artifact found");

        let credential = self.wait_for_activation(credential).await?;
        info!(org_id = %credential.org_id, "org credential activated");
        Ok(credential)
    }

    async fn wait_for_artifact(&self, path: &Path) -> Result<()> {
        let fs = Arc::clone(&self.fs);
        poll_until("credential artifact", self.poll_options(), |attempt| {
            let found = fs.is_file(path);
            if !found && attempt == 1 {
                info!(path = ?path, "waiting for credential artifact");
            }
            async move { found.then_some(()) }
        })
        .await
    }

    async fn wait_for_activation(&self, credential: OrgCredential) -> Result<OrgCredential> {
        let org_id = credential.org_id.as_str();
        poll_until("api key activation", self.poll_options(), |attempt| async move {
            match self.status.fetch_status(org_id).await {
                Ok(body) => match ActivationStatus::from_body(&body) {
                    ActivationStatus::Activated => Some(()),
                    ActivationStatus::Pending => {
                        debug!(attempt, body = %body.trim(), "api key not activated yet");
                        None
                    }
                },
                Err(e) => {
                    debug!(attempt, error = %e, "activation status request failed; retrying");
                    None
                }
            }
        })
        .await?;

        Ok(credential.activated())
    }
}
