// src/lib.rs

pub mod auth;
pub mod cleanup;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod lock;
pub mod logging;
pub mod platform;
pub mod poll;
pub mod supervisor;
pub mod types;
pub mod worker;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use crate::auth::HandshakeCoordinator;
use crate::cleanup::{
    ChildGroups, ExitGuard, ExitHandler, ProcessGroupSignaller, wait_for_shutdown_signal,
};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, RawConfigFile, apply_env_overrides, load_or_default};
use crate::errors::SupervisorError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::lock::{IdentityResource, LockGuard, SignalTerminator, detect_lookup};
use crate::platform::{PlatformProfile, resolve_config_path};
use crate::supervisor::{RetrySupervisor, Session, SupervisorOutcome};
use crate::worker::{LaunchPlan, ProcessWorkerBackend};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, env, CLI)
/// - the exit handler (armed before anything is started)
/// - the auth handshake
/// - the retry supervisor with the lock guard and process backend
/// - shutdown signal handling
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> Result<i32> {
    let cfg = load_config(&args)?;
    let profile = PlatformProfile::detect(cfg.worker.cpu_only);

    if args.dry_run {
        print_dry_run(&cfg, &profile);
        return Ok(0);
    }

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let children = ChildGroups::default();
    let handler = Arc::new(ExitHandler::new(
        cfg.auth.artifact_dir.clone(),
        Arc::clone(&fs),
        Box::new(ProcessGroupSignaller::new(children.clone())),
    ));
    let _guard = ExitGuard::new(Arc::clone(&handler));

    let code = supervise(
        run_session(&cfg, &profile, Arc::clone(&fs), children),
        wait_for_shutdown_signal(),
        Arc::clone(&handler),
    )
    .await;
    Ok(code)
}

/// Race a session against a shutdown signal, then fire the exit handler.
///
/// Returns the process exit code: 0 for success or a clean signal
/// shutdown, [`SupervisorError::exit_code`] otherwise. The losing future is
/// dropped, which kills a running worker through `kill_on_drop`.
pub async fn supervise<T, S, F>(session: S, shutdown: F, handler: Arc<ExitHandler>) -> i32
where
    T: fmt::Debug,
    S: Future<Output = errors::Result<T>>,
    F: Future<Output = Result<String>>,
{
    let result = tokio::select! {
        res = session => res,
        sig = shutdown => match sig {
            Ok(name) => Err(SupervisorError::SignalInterrupt(name)),
            Err(e) => Err(SupervisorError::Other(e)),
        },
    };

    let code = match &result {
        Ok(outcome) => {
            info!(?outcome, "session finished");
            0
        }
        Err(SupervisorError::SignalInterrupt(name)) => {
            warn!(signal = %name, "shutdown requested");
            0
        }
        Err(e) => {
            error!(error = %e, "session failed");
            e.exit_code()
        }
    };

    handler.fire();
    code
}

/// File (or defaults) → environment → CLI flags → validation.
pub fn load_config(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = load_or_default(args.config.as_deref())?;
    apply_env_overrides(&mut raw, |k| std::env::var(k).ok());
    apply_cli_overrides(&mut raw, args);
    Ok(ConfigFile::try_from(raw)?)
}

/// CLI flags win over file and environment.
pub fn apply_cli_overrides(raw: &mut RawConfigFile, args: &CliArgs) {
    if args.no_auth {
        raw.auth.enabled = false;
    }
    if let Some(org_id) = &args.org_id {
        raw.worker.org_id = Some(org_id.clone());
    }
    if args.cpu_only {
        raw.worker.cpu_only = true;
    }
    if let Some(max_retries) = args.max_retries {
        raw.supervisor.max_retries = max_retries;
    }
    if let Some(path) = &args.identity_path {
        raw.lock.identity_path = path.clone();
    }
}

/// Handshake (if needed), then retry the worker until success or exhaustion.
async fn run_session(
    cfg: &ConfigFile,
    profile: &PlatformProfile,
    fs: Arc<dyn FileSystem>,
    children: ChildGroups,
) -> errors::Result<SupervisorOutcome> {
    let org_id = resolve_org_id(cfg, Arc::clone(&fs), children).await?;

    let plan = LaunchPlan {
        worker: cfg.worker.clone(),
        identity: IdentityResource::new(cfg.lock.identity_path.clone()),
        org_id,
        config_path: resolve_config_path(profile, &cfg.worker),
    };

    let lookup = detect_lookup(&cfg.lock.process_name);
    info!(lookup = lookup.name(), "lock holder lookup selected");
    let lock = LockGuard::new(
        fs,
        lookup,
        Box::new(SignalTerminator),
        cfg.lock.settle_interval,
    );

    let worker = ProcessWorkerBackend::new(&cfg.worker, profile.worker_env());
    let session = Session::new(cfg.supervisor.max_retries, cfg.supervisor.retry_delay);

    RetrySupervisor::new(session, lock, worker, plan).run().await
}

/// The org id the worker should use, if any.
///
/// - an override (config, `ORG_ID`, `--org-id`) is used as-is,
/// - a disabled handshake means peer-address mode,
/// - otherwise run the handshake.
async fn resolve_org_id(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    children: ChildGroups,
) -> errors::Result<Option<String>> {
    if let Some(org_id) = cfg.worker.org_id_override() {
        info!(org_id, "using org id override; skipping auth handshake");
        return Ok(Some(org_id.to_string()));
    }
    if !cfg.auth.enabled {
        info!("auth handshake disabled; joining with peer addresses");
        return Ok(None);
    }

    let coordinator = HandshakeCoordinator::from_settings(cfg.auth.clone(), fs, children)?;
    let credential = coordinator.obtain_activated_credential().await?;
    Ok(Some(credential.org_id))
}

/// Dry-run output: print the resolved plan without starting anything.
fn print_dry_run(cfg: &ConfigFile, profile: &PlatformProfile) {
    println!("swarm-supervisor dry-run");
    println!("  platform = {:?}", profile);
    println!(
        "  supervisor: max_retries = {}, retry_delay = {:?}",
        cfg.supervisor.max_retries, cfg.supervisor.retry_delay
    );
    println!(
        "  lock: identity_path = {:?}, settle_interval = {:?}",
        cfg.lock.identity_path, cfg.lock.settle_interval
    );

    let org_id = cfg.worker.org_id_override().map(str::to_string);
    if org_id.is_some() {
        println!("  auth: skipped (org id override)");
    } else if cfg.auth.enabled {
        println!(
            "  auth: {} {} in {:?}, url = {}, artifact = {:?}, poll = {:?}, timeout = {:?}",
            cfg.auth.service_program,
            cfg.auth.service_args.join(" "),
            cfg.auth.service_dir,
            cfg.auth.url,
            cfg.auth.artifact_path(),
            cfg.auth.poll_interval,
            cfg.auth.timeout
        );
    } else {
        println!("  auth: disabled");
    }

    let plan = LaunchPlan {
        worker: cfg.worker.clone(),
        identity: IdentityResource::new(cfg.lock.identity_path.clone()),
        // Placeholder so the org-id command line can be shown before login.
        org_id: org_id.or_else(|| cfg.auth.enabled.then(|| "<org-id>".to_string())),
        config_path: resolve_config_path(profile, &cfg.worker),
    };
    let backend = ProcessWorkerBackend::new(&cfg.worker, profile.worker_env());
    let invocation = plan.invocation();

    println!("  worker ({}):", invocation.mode);
    println!(
        "      {} {}",
        cfg.worker.program,
        backend.command_args(&invocation).join(" ")
    );
}
