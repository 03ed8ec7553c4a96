// src/platform.rs

//! Host capability detection.
//!
//! The supervisor only needs three facts about the machine: whether it is a
//! Mac, whether an NVIDIA GPU is usable, and whether the user asked for CPU
//! only. Everything else derives from those.

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::WorkerSettings;

/// Read-only description of the host, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformProfile {
    pub is_darwin: bool,
    pub has_gpu: bool,
    pub cpu_only: bool,
}

impl PlatformProfile {
    /// Probe the current host.
    ///
    /// A GPU counts as present when `nvidia-smi` is on `PATH`.
    pub fn detect(cpu_only: bool) -> Self {
        let profile = Self {
            is_darwin: cfg!(target_os = "macos"),
            has_gpu: command_on_path("nvidia-smi"),
            cpu_only,
        };
        debug!(?profile, "detected platform profile");
        profile
    }

    pub fn uses_gpu(&self) -> bool {
        self.has_gpu && !self.cpu_only
    }

    /// Extra environment for the worker process.
    ///
    /// On macOS the MPS allocator's high watermark is disabled so the model
    /// can use the full unified memory.
    pub fn worker_env(&self) -> Vec<(String, String)> {
        let mut env = Vec::new();
        if self.is_darwin {
            env.push((
                "PYTORCH_MPS_HIGH_WATERMARK_RATIO".to_string(),
                "0.0".to_string(),
            ));
        }
        env
    }
}

/// Pick the worker config: GPU config when a GPU is usable, otherwise the
/// CPU/Mac config.
pub fn resolve_config_path(profile: &PlatformProfile, worker: &WorkerSettings) -> PathBuf {
    if profile.uses_gpu() {
        worker.gpu_config.clone()
    } else {
        worker.cpu_config.clone()
    }
}

/// Whether an executable called `name` exists in one of the `PATH` entries.
pub fn command_on_path(name: &str) -> bool {
    let Some(paths) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&paths).any(|dir| is_executable(&dir.join(name)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(has_gpu: bool, cpu_only: bool) -> PlatformProfile {
        PlatformProfile {
            is_darwin: false,
            has_gpu,
            cpu_only,
        }
    }

    #[test]
    fn gpu_config_only_when_gpu_and_not_cpu_only() {
        let worker = WorkerSettings::default();

        assert_eq!(resolve_config_path(&profile(true, false), &worker), worker.gpu_config);
        assert_eq!(resolve_config_path(&profile(true, true), &worker), worker.cpu_config);
        assert_eq!(resolve_config_path(&profile(false, false), &worker), worker.cpu_config);
    }

    #[test]
    fn darwin_gets_mps_watermark() {
        let mac = PlatformProfile {
            is_darwin: true,
            has_gpu: false,
            cpu_only: false,
        };
        assert_eq!(
            mac.worker_env(),
            vec![(
                "PYTORCH_MPS_HIGH_WATERMARK_RATIO".to_string(),
                "0.0".to_string()
            )]
        );
        assert!(profile(true, false).worker_env().is_empty());
    }

    #[test]
    fn missing_command_is_not_on_path() {
        assert!(!command_on_path("definitely-not-a-real-binary-7f3a"));
    }
}
