// src/cleanup/mod.rs

//! Exit/signal handling.
//!
//! On every way out of a session (success, error, interrupt, panic) we
//! 1. delete the transient credential artifacts, then
//! 2. terminate the detached children's process groups (the auth service),
//! 3. terminate our own process group when we lead it (worker, helpers).
//!
//! [`ExitHandler::fire`] does all of it and is idempotent. [`ExitGuard`]
//! fires it from `Drop` so early returns and panics are covered too. Signal
//! listening lives in [`signal`].

pub mod signal;

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::fs::FileSystem;

pub use signal::wait_for_shutdown_signal;

/// Sends a termination signal to every process we are responsible for.
pub trait GroupSignaller: Send + Sync {
    fn terminate_group(&self) -> Result<()>;
}

/// Process groups of detached children that must not outlive us.
///
/// Clones share the same list: the launcher registers, the exit handler
/// drains.
#[derive(Debug, Clone, Default)]
pub struct ChildGroups {
    pgids: Arc<Mutex<Vec<u32>>>,
}

impl ChildGroups {
    pub fn register(&self, pgid: u32) {
        debug!(pgid, "tracking child process group");
        self.lock().push(pgid);
    }

    pub fn snapshot(&self) -> Vec<u32> {
        self.lock().clone()
    }

    fn take(&self) -> Vec<u32> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u32>> {
        self.pgids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Real process-group signaller.
///
/// Registered child groups are always sent `SIGTERM`. Our own group is only
/// signalled when this process leads it: when started from a wrapper or a
/// non-interactive parent, the group also contains the parent.
#[derive(Debug, Clone, Default)]
pub struct ProcessGroupSignaller {
    children: ChildGroups,
}

impl ProcessGroupSignaller {
    pub fn new(children: ChildGroups) -> Self {
        Self { children }
    }
}

#[cfg(unix)]
impl GroupSignaller for ProcessGroupSignaller {
    fn terminate_group(&self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{SigHandler, Signal, killpg, signal};
        use nix::unistd::{Pid, getpgrp, getpid};

        for pgid in self.children.take() {
            #[allow(clippy::cast_possible_wrap)]
            match killpg(Pid::from_raw(pgid as i32), Signal::SIGTERM) {
                Ok(()) => debug!(pgid, "sent SIGTERM to child process group"),
                Err(Errno::ESRCH) => debug!(pgid, "child process group already gone"),
                Err(e) => warn!(pgid, error = %e, "failed to signal child process group"),
            }
        }

        let group = getpgrp();
        if group != getpid() {
            warn!(
                pgid = group.as_raw(),
                "not the process group leader; skipping own group termination"
            );
            return Ok(());
        }

        // We are about to exit with our own code; don't let our own SIGTERM
        // decide it.
        // SAFETY: installing SIG_IGN does not run any handler code.
        unsafe { signal(Signal::SIGTERM, SigHandler::SigIgn) }?;

        killpg(group, Signal::SIGTERM)?;
        debug!(pgid = group.as_raw(), "sent SIGTERM to process group");
        Ok(())
    }
}

#[cfg(not(unix))]
impl GroupSignaller for ProcessGroupSignaller {
    fn terminate_group(&self) -> Result<()> {
        use sysinfo::{Pid, System};

        // No process groups here: kill the registered children directly.
        let pids = self.children.take();
        if pids.is_empty() {
            return Ok(());
        }

        let mut system = System::new();
        system.refresh_processes();
        for pid in pids {
            match system.process(Pid::from_u32(pid)) {
                Some(process) if !process.kill() => {
                    warn!(pid, "failed to kill child process")
                }
                Some(_) => debug!(pid, "killed child process"),
                None => debug!(pid, "child process already gone"),
            }
        }
        Ok(())
    }
}

/// Cleanup run once on the way out.
pub struct ExitHandler {
    artifact_dir: PathBuf,
    fs: Arc<dyn FileSystem>,
    signaller: Box<dyn GroupSignaller>,
    fired: AtomicBool,
}

impl fmt::Debug for ExitHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExitHandler")
            .field("artifact_dir", &self.artifact_dir)
            .field("fired", &self.has_fired())
            .finish_non_exhaustive()
    }
}

impl ExitHandler {
    pub fn new(
        artifact_dir: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
        signaller: Box<dyn GroupSignaller>,
    ) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            fs,
            signaller,
            fired: AtomicBool::new(false),
        }
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    /// Delete credential artifacts and terminate the process group.
    ///
    /// Errors are logged and ignored. Only the first call does anything.
    pub fn fire(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!("exit handler already ran");
            return;
        }

        info!("cleaning up: removing credential artifacts and stopping child processes");
        let removed = self.remove_artifacts();
        debug!(removed, dir = ?self.artifact_dir, "credential artifacts removed");

        if let Err(e) = self.signaller.terminate_group() {
            warn!(error = %e, "failed to signal process group; ignoring");
        }
    }

    /// Remove every file directly inside the artifact directory.
    fn remove_artifacts(&self) -> usize {
        if !self.fs.is_dir(&self.artifact_dir) {
            return 0;
        }

        let entries = match self.fs.read_dir(&self.artifact_dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = ?self.artifact_dir, error = %e, "cannot list artifact directory");
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries.into_iter().filter(|p| self.fs.is_file(p)) {
            match self.fs.remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = ?path, error = %e, "failed to remove artifact"),
            }
        }
        removed
    }
}

/// Fires the wrapped [`ExitHandler`] when dropped.
#[derive(Debug)]
pub struct ExitGuard {
    handler: Arc<ExitHandler>,
}

impl ExitGuard {
    pub fn new(handler: Arc<ExitHandler>) -> Self {
        Self { handler }
    }
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.handler.fire();
    }
}
