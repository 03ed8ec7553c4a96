// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `swarm-supervisor`.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "swarm-supervisor",
    version,
    about = "Authenticate, then keep a swarm training node running with bounded retries.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `swarm-supervisor.toml` in the current working directory if it
    /// exists, otherwise built-in defaults.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SWARM_SUPERVISOR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the launch plan, but don't start anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the auth handshake and join the swarm with peer addresses only.
    #[arg(long)]
    pub no_auth: bool,

    /// Use an already activated org id instead of running the handshake.
    #[arg(long, value_name = "ID")]
    pub org_id: Option<String>,

    /// Force the CPU config even if a GPU is present.
    #[arg(long)]
    pub cpu_only: bool,

    /// Override `[supervisor].max_retries`.
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Override the identity key file path.
    #[arg(long, value_name = "PATH")]
    pub identity_path: Option<PathBuf>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_overrides() {
        let args = CliArgs::try_parse_from([
            "swarm-supervisor",
            "--no-auth",
            "--max-retries",
            "3",
            "--identity-path",
            "/tmp/swarm.pem",
        ])
        .unwrap();

        assert!(args.no_auth);
        assert_eq!(args.max_retries, Some(3));
        assert_eq!(args.identity_path, Some(PathBuf::from("/tmp/swarm.pem")));
        assert!(args.config.is_none());
    }
}
