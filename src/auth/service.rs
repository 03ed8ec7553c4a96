// src/auth/service.rs

//! Starting the external login service and pointing the user's browser at it.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::info;

use crate::cleanup::ChildGroups;
use crate::config::AuthSettings;

/// Starts the auth service and opens its login page.
///
/// Tests replace this with a no-op implementation.
pub trait AuthServiceLauncher: Send + Sync {
    /// Start the service in the background. Must not wait for it.
    fn start(&self) -> Result<()>;

    /// Open `url` in the default browser.
    fn open_browser(&self, url: &str) -> Result<()>;
}

/// Spawns the configured service command as a detached child.
///
/// On unix the child leads a new process group (so the service and anything
/// it forks can be signalled together) and that group is registered in
/// [`ChildGroups`] for the exit handler.
#[derive(Debug, Clone)]
pub struct ProcessServiceLauncher {
    program: String,
    args: Vec<String>,
    dir: PathBuf,
    children: ChildGroups,
}

impl ProcessServiceLauncher {
    pub fn from_settings(settings: &AuthSettings, children: ChildGroups) -> Self {
        Self {
            program: settings.service_program.clone(),
            args: settings.service_args.clone(),
            dir: settings.service_dir.clone(),
            children,
        }
    }
}

impl AuthServiceLauncher for ProcessServiceLauncher {
    fn start(&self) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);
        #[cfg(unix)]
        command.process_group(0);

        let child = command
            .spawn()
            .with_context(|| {
                format!(
                    "spawning auth service '{} {}' in {:?}",
                    self.program,
                    self.args.join(" "),
                    self.dir
                )
            })?;

        info!(
            pid = child.id(),
            program = %self.program,
            dir = ?self.dir,
            "auth service started"
        );
        // pid == pgid for a new group leader.
        if let Some(pid) = child.id() {
            self.children.register(pid);
        }
        // Dropping the handle detaches the child; tokio reaps it in the background.
        drop(child);
        Ok(())
    }

    fn open_browser(&self, url: &str) -> Result<()> {
        let (program, args) = browser_command(url);
        std::process::Command::new(program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("running {program} to open {url}"))?;
        Ok(())
    }
}

/// The platform's "open this URL" command.
pub fn browser_command(url: &str) -> (&'static str, Vec<String>) {
    if cfg!(target_os = "macos") {
        ("open", vec![url.to_string()])
    } else if cfg!(windows) {
        (
            "cmd",
            vec!["/C".to_string(), "start".to_string(), String::new(), url.to_string()],
        )
    } else {
        ("xdg-open", vec![url.to_string()])
    }
}
