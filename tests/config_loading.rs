// tests/config_loading.rs

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;

use swarm_supervisor::apply_cli_overrides;
use swarm_supervisor::cli::CliArgs;
use swarm_supervisor::config::{ConfigFile, apply_env_overrides, load_from_path, load_or_default};
use swarm_supervisor::errors::SupervisorError;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn validate(path: &Path) -> Result<ConfigFile, SupervisorError> {
    ConfigFile::try_from(load_from_path(path)?)
}

#[test]
fn empty_file_yields_defaults() {
    let file = write_config("");
    let cfg = validate(file.path()).unwrap();

    assert_eq!(cfg.supervisor.max_retries, 10);
    assert_eq!(cfg.supervisor.retry_delay, Duration::from_secs(120));
    assert_eq!(cfg.lock.settle_interval, Duration::from_secs(2));
    assert_eq!(cfg.lock.identity_path.to_str(), Some("swarm.pem"));
    assert!(cfg.auth.enabled);
    assert_eq!(cfg.auth.poll_interval, Duration::from_secs(5));
    assert_eq!(cfg.auth.timeout, None);
    assert_eq!(
        cfg.auth.artifact_path().to_str(),
        Some("modal-login/temp-data/userData.json")
    );
    assert_eq!(cfg.worker.org_id_override(), None);
}

#[test]
fn file_values_are_used() {
    let file = write_config(
        r#"
[supervisor]
max_retries = 3
retry_delay = "30s"

[lock]
identity_path = "/keys/node.pem"

[auth]
url = "http://127.0.0.1:4000/"
poll_interval = "500ms"
timeout = "10m"

[worker]
org_id = "org-from-file"
"#,
    );
    let cfg = validate(file.path()).unwrap();

    assert_eq!(cfg.supervisor.max_retries, 3);
    assert_eq!(cfg.supervisor.retry_delay, Duration::from_secs(30));
    assert_eq!(cfg.lock.identity_path.to_str(), Some("/keys/node.pem"));
    assert_eq!(cfg.auth.url, "http://127.0.0.1:4000");
    assert_eq!(cfg.auth.poll_interval, Duration::from_millis(500));
    assert_eq!(cfg.auth.timeout, Some(Duration::from_secs(600)));
    assert_eq!(cfg.worker.org_id_override(), Some("org-from-file"));
}

#[test]
fn bad_duration_is_a_config_error() {
    let file = write_config("[supervisor]\nretry_delay = \"two minutes\"\n");
    let err = validate(file.path()).unwrap_err();

    match err {
        SupervisorError::ConfigError(msg) => assert!(msg.contains("retry_delay"), "{msg}"),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_retries_is_rejected() {
    let file = write_config("[supervisor]\nmax_retries = 0\n");
    assert!(matches!(
        validate(file.path()),
        Err(SupervisorError::ConfigError(_))
    ));
}

#[test]
fn non_http_url_is_rejected() {
    let file = write_config("[auth]\nurl = \"localhost:3000\"\n");
    assert!(matches!(
        validate(file.path()),
        Err(SupervisorError::ConfigError(_))
    ));
}

#[test]
fn invalid_toml_is_reported() {
    let file = write_config("[supervisor\nmax_retries = 3\n");
    assert!(matches!(
        load_from_path(file.path()),
        Err(SupervisorError::TomlError(_))
    ));
}

#[test]
fn explicit_missing_path_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_or_default(Some(&missing)),
        Err(SupervisorError::IoError(_))
    ));
}

#[test]
fn cli_flags_win_over_environment_and_file() {
    let file = write_config(
        r#"
[supervisor]
max_retries = 3

[lock]
identity_path = "file.pem"
"#,
    );
    let mut raw = load_from_path(file.path()).unwrap();

    let env: HashMap<&str, &str> = HashMap::from([
        ("IDENTITY_PATH", "env.pem"),
        ("ORG_ID", "env-org"),
        ("PEER_MULTI_ADDRS", "/ip4/10.0.0.1/tcp/1"),
    ]);
    apply_env_overrides(&mut raw, |k| env.get(k).map(|v| v.to_string()));

    let args = CliArgs {
        org_id: Some("cli-org".to_string()),
        max_retries: Some(5),
        no_auth: true,
        cpu_only: true,
        ..Default::default()
    };
    apply_cli_overrides(&mut raw, &args);

    let cfg = ConfigFile::try_from(raw).unwrap();
    assert_eq!(cfg.supervisor.max_retries, 5);
    assert_eq!(cfg.lock.identity_path.to_str(), Some("env.pem"));
    assert_eq!(cfg.worker.org_id_override(), Some("cli-org"));
    assert_eq!(cfg.worker.initial_peers, "/ip4/10.0.0.1/tcp/1");
    assert!(cfg.worker.cpu_only);
    assert!(!cfg.auth.enabled);
}
