// src/lock/mod.rs

//! Resource lock guard.
//!
//! The identity key file may only be open in one process. A worker that
//! crashed (or was left over from a previous run) can keep it open, so
//! before every attempt we find whoever holds it and kill them.
//!
//! - [`lookup`] holds the [`HolderLookup`] strategies (`lsof`, process table).
//! - [`terminate`] holds the [`Terminator`] used to kill holders.
//!
//! Everything here is best-effort: failures are logged as lock cleanup
//! errors and never stop the attempt.

pub mod lookup;
pub mod terminate;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::SupervisorError;
use crate::fs::FileSystem;

pub use lookup::{HolderLookup, LsofLookup, ProcessTableLookup, detect_lookup};
pub use terminate::{SignalTerminator, Terminator};

/// The exclusively-lockable identity key file. Never deleted by us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityResource {
    pub path: PathBuf,
}

impl IdentityResource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Seam used by the retry supervisor: make sure nobody else holds the
/// resource before launching a worker.
pub trait LockRelease: Send + Sync {
    fn release<'a>(
        &'a self,
        resource: &'a IdentityResource,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;
}

/// Finds holders of the identity file, kills them, then waits for the OS to
/// let go of the file handle.
pub struct LockGuard {
    fs: Arc<dyn FileSystem>,
    lookup: Box<dyn HolderLookup>,
    terminator: Box<dyn Terminator>,
    settle_interval: Duration,
}

impl LockGuard {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        lookup: Box<dyn HolderLookup>,
        terminator: Box<dyn Terminator>,
        settle_interval: Duration,
    ) -> Self {
        Self {
            fs,
            lookup,
            terminator,
            settle_interval,
        }
    }

    /// Kill every process holding `resource` open.
    ///
    /// - Missing file: no-op.
    /// - Our own pid is never killed.
    /// - After at least one kill, waits the settle interval.
    ///
    /// Returns the pids a termination was issued to.
    pub async fn release_lock(&self, resource: &IdentityResource) -> Vec<u32> {
        let path = resource.path();
        if !self.fs.exists(path) {
            debug!(path = ?path, "identity file does not exist; nothing to release");
            return Vec::new();
        }

        let holders = match self.lookup.holders(path).await {
            Ok(pids) => pids,
            Err(e) => {
                let err = SupervisorError::LockCleanup(format!(
                    "{} lookup failed for {:?}: {:#}",
                    self.lookup.name(),
                    path,
                    e
                ));
                warn!(error = %err, "could not determine lock holders; continuing");
                return Vec::new();
            }
        };

        let own_pid = std::process::id();
        let mut terminated = Vec::new();

        for pid in holders.into_iter().filter(|&pid| pid != own_pid) {
            info!(pid, path = ?path, "terminating stale holder of identity file");
            match self.terminator.terminate(pid) {
                Ok(()) => terminated.push(pid),
                Err(e) => {
                    let err = SupervisorError::LockCleanup(format!("pid {}: {:#}", pid, e));
                    warn!(error = %err, "failed to terminate lock holder; ignoring");
                    // It may have exited on its own; still give the OS time.
                    terminated.push(pid);
                }
            }
        }

        if !terminated.is_empty() {
            debug!(settle = ?self.settle_interval, "waiting for file handles to be released");
            sleep(self.settle_interval).await;
        }

        terminated
    }
}

impl LockRelease for LockGuard {
    fn release<'a>(
        &'a self,
        resource: &'a IdentityResource,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.release_lock(resource).await;
        })
    }
}
