// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// max_retries = 10
/// retry_delay = "120s"
///
/// [lock]
/// identity_path = "swarm.pem"
///
/// [auth]
/// url = "http://localhost:3000"
/// poll_interval = "5s"
///
/// [worker]
/// program = "python"
/// args = ["-m", "hivemind_exp.gsm8k.train_single_gpu"]
/// ```
///
/// All sections are optional and have reasonable defaults. The file itself
/// is optional too.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub supervisor: RawSupervisorSection,

    #[serde(default)]
    pub lock: RawLockSection,

    #[serde(default)]
    pub auth: RawAuthSection,

    #[serde(default)]
    pub worker: WorkerSettings,
}

/// `[supervisor]` section: retry budget and backoff.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSupervisorSection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts, e.g. `"120s"`.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
}

fn default_max_retries() -> u32 {
    10
}

fn default_retry_delay() -> String {
    "120s".to_string()
}

impl Default for RawSupervisorSection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// `[lock]` section: the identity key file and how stale holders are found.
#[derive(Debug, Clone, Deserialize)]
pub struct RawLockSection {
    #[serde(default = "default_identity_path")]
    pub identity_path: PathBuf,

    /// Time given to the OS to release file handles after killing holders.
    #[serde(default = "default_settle_interval")]
    pub settle_interval: String,

    /// Executable name used by the process-table fallback.
    #[serde(default = "default_process_name")]
    pub process_name: String,
}

fn default_identity_path() -> PathBuf {
    PathBuf::from("swarm.pem")
}

fn default_settle_interval() -> String {
    "2s".to_string()
}

fn default_process_name() -> String {
    "python".to_string()
}

impl Default for RawLockSection {
    fn default() -> Self {
        Self {
            identity_path: default_identity_path(),
            settle_interval: default_settle_interval(),
            process_name: default_process_name(),
        }
    }
}

/// `[auth]` section: the external login service and its handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthSection {
    /// When false the handshake is skipped and the worker joins with peer
    /// addresses only.
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_service_program")]
    pub service_program: String,

    #[serde(default = "default_service_args")]
    pub service_args: Vec<String>,

    /// Working directory of the auth service.
    #[serde(default = "default_service_dir")]
    pub service_dir: PathBuf,

    #[serde(default = "default_url")]
    pub url: String,

    #[serde(default = "default_true")]
    pub open_browser: bool,

    /// Directory holding transient credential artifacts. Emptied on exit.
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    #[serde(default = "default_artifact_file")]
    pub artifact_file: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    /// Upper bound for each handshake wait. Unset means wait forever.
    #[serde(default)]
    pub timeout: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_service_program() -> String {
    "yarn".to_string()
}

fn default_service_args() -> Vec<String> {
    vec!["start".to_string()]
}

fn default_service_dir() -> PathBuf {
    PathBuf::from("modal-login")
}

fn default_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("modal-login/temp-data")
}

fn default_artifact_file() -> String {
    "userData.json".to_string()
}

fn default_poll_interval() -> String {
    "5s".to_string()
}

impl Default for RawAuthSection {
    fn default() -> Self {
        Self {
            enabled: true,
            service_program: default_service_program(),
            service_args: default_service_args(),
            service_dir: default_service_dir(),
            url: default_url(),
            open_browser: true,
            artifact_dir: default_artifact_dir(),
            artifact_file: default_artifact_file(),
            poll_interval: default_poll_interval(),
            timeout: None,
        }
    }
}

/// `[worker]` section: the training node command line.
///
/// Nothing here needs validation beyond deserialisation, so the raw and
/// validated forms are the same type.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    #[serde(default = "default_program")]
    pub program: String,

    /// Arguments placed before the generated `--flag value` pairs.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    #[serde(default = "default_hf_token")]
    pub hf_token: String,

    /// Publicly reachable address; empty lets the worker discover its own.
    #[serde(default)]
    pub public_maddr: String,

    #[serde(default = "default_initial_peers")]
    pub initial_peers: String,

    #[serde(default = "default_host_maddr")]
    pub host_maddr: String,

    #[serde(default = "default_gpu_config")]
    pub gpu_config: PathBuf,

    #[serde(default = "default_cpu_config")]
    pub cpu_config: PathBuf,

    #[serde(default)]
    pub cpu_only: bool,

    /// Pre-activated org id. Skips the auth handshake when set.
    #[serde(default)]
    pub org_id: Option<String>,
}

fn default_program() -> String {
    "python".to_string()
}

fn default_args() -> Vec<String> {
    vec![
        "-m".to_string(),
        "hivemind_exp.gsm8k.train_single_gpu".to_string(),
    ]
}

fn default_hf_token() -> String {
    "None".to_string()
}

fn default_initial_peers() -> String {
    "/ip4/38.101.215.13/tcp/30002/p2p/QmQ2gEXoPJg6iMBSUFWGzAabS2VhnzuS782Y637hGjfsRJ".to_string()
}

fn default_host_maddr() -> String {
    "/ip4/0.0.0.0/tcp/38331".to_string()
}

fn default_gpu_config() -> PathBuf {
    PathBuf::from("hivemind_exp/configs/gpu/grpo-qwen-2.5-0.5b-deepseek-r1.yaml")
}

fn default_cpu_config() -> PathBuf {
    PathBuf::from("hivemind_exp/configs/mac/grpo-qwen-2.5-0.5b-deepseek-r1.yaml")
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            hf_token: default_hf_token(),
            public_maddr: String::new(),
            initial_peers: default_initial_peers(),
            host_maddr: default_host_maddr(),
            gpu_config: default_gpu_config(),
            cpu_config: default_cpu_config(),
            cpu_only: false,
            org_id: None,
        }
    }
}

impl WorkerSettings {
    /// The org id override, ignoring empty strings.
    pub fn org_id_override(&self) -> Option<&str> {
        self.org_id.as_deref().filter(|id| !id.trim().is_empty())
    }
}

/// Validated configuration used by the rest of the application.
///
/// Built from [`RawConfigFile`] via `TryFrom` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub supervisor: SupervisorSettings,
    pub lock: LockSettings,
    pub auth: AuthSettings,
    pub worker: WorkerSettings,
}

#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct LockSettings {
    pub identity_path: PathBuf,
    pub settle_interval: Duration,
    pub process_name: String,
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub enabled: bool,
    pub service_program: String,
    pub service_args: Vec<String>,
    pub service_dir: PathBuf,
    pub url: String,
    pub open_browser: bool,
    pub artifact_dir: PathBuf,
    pub artifact_file: String,
    pub poll_interval: Duration,
    pub timeout: Option<Duration>,
}

impl AuthSettings {
    /// Full path of the credential artifact the login flow writes.
    pub fn artifact_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.artifact_file)
    }
}
