// src/worker/invocation.rs

use std::path::PathBuf;

use crate::config::WorkerSettings;
use crate::lock::IdentityResource;
use crate::types::LaunchMode;

/// One worker command line, built fresh for every attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerInvocation {
    pub mode: LaunchMode,
    /// Ordered `(flag, value)` pairs, flags without the leading `--`.
    pub args: Vec<(String, String)>,
}

impl WorkerInvocation {
    /// Flatten into `--flag value` command-line arguments.
    pub fn to_args(&self) -> Vec<String> {
        self.args
            .iter()
            .flat_map(|(flag, value)| [format!("--{flag}"), value.clone()])
            .collect()
    }

    /// Look up a flag's value.
    pub fn get(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(f, _)| f == flag)
            .map(|(_, v)| v.as_str())
    }
}

/// Everything needed to build a [`WorkerInvocation`]. Fixed for a session.
#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub worker: WorkerSettings,
    pub identity: IdentityResource,
    /// Activated org id; `None` or empty means peer-address mode.
    pub org_id: Option<String>,
    pub config_path: PathBuf,
}

impl LaunchPlan {
    pub fn mode(&self) -> LaunchMode {
        match self.org_id.as_deref() {
            Some(id) if !id.is_empty() => LaunchMode::WithOrgId,
            _ => LaunchMode::WithNetworkAddrs,
        }
    }

    pub fn invocation(&self) -> WorkerInvocation {
        let mode = self.mode();
        let mut args = vec![
            arg("hf_token", &self.worker.hf_token),
            arg("identity_path", self.identity.path().to_string_lossy()),
        ];

        match mode {
            LaunchMode::WithOrgId => {
                args.push(arg("modal_org_id", self.org_id.as_deref().unwrap_or_default()));
            }
            LaunchMode::WithNetworkAddrs => {
                args.push(arg("public_maddr", &self.worker.public_maddr));
                args.push(arg("initial_peers", &self.worker.initial_peers));
                args.push(arg("host_maddr", &self.worker.host_maddr));
            }
        }

        args.push(arg("config", self.config_path.to_string_lossy()));

        WorkerInvocation { mode, args }
    }
}

fn arg(flag: &str, value: impl AsRef<str>) -> (String, String) {
    (flag.to_string(), value.as_ref().to_string())
}
