// src/lock/lookup.rs

//! Strategies for finding processes that hold a file open.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use anyhow::{Context, Result, bail};
use sysinfo::System;
use tokio::process::Command;
use tracing::debug;

use crate::platform::command_on_path;

/// Finds the pids of processes that currently hold a file open.
///
/// Production code picks an implementation with [`detect_lookup`]; tests
/// provide a fake returning a fixed pid list.
pub trait HolderLookup: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    fn holders<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u32>>> + Send + 'a>>;
}

/// Asks `lsof -t <path>` for the holders. POSIX hosts with `lsof` installed.
#[derive(Debug, Clone, Default)]
pub struct LsofLookup;

impl HolderLookup for LsofLookup {
    fn name(&self) -> &'static str {
        "lsof"
    }

    fn holders<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u32>>> + Send + 'a>> {
        Box::pin(async move {
            let output = Command::new("lsof")
                .arg("-t")
                .arg(path)
                .output()
                .await
                .context("running lsof")?;

            let stdout = String::from_utf8_lossy(&output.stdout);

            // lsof exits 1 when nothing holds the file.
            if !output.status.success() && !stdout.trim().is_empty() {
                bail!(
                    "lsof exited with {} for {:?}: {}",
                    output.status,
                    path,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
            }

            Ok(parse_pid_lines(&stdout))
        })
    }
}

/// Fallback for hosts without `lsof`: scan the process table for processes
/// with a matching executable name whose command line mentions the file.
#[derive(Debug, Clone)]
pub struct ProcessTableLookup {
    process_name: String,
}

impl ProcessTableLookup {
    pub fn new(process_name: impl Into<String>) -> Self {
        Self {
            process_name: process_name.into(),
        }
    }
}

impl HolderLookup for ProcessTableLookup {
    fn name(&self) -> &'static str {
        "process-table"
    }

    fn holders<'a>(
        &'a self,
        path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<u32>>> + Send + 'a>> {
        Box::pin(async move {
            let mut system = System::new();
            system.refresh_processes();

            let mut pids: Vec<u32> = system
                .processes()
                .iter()
                .filter(|(_, process)| {
                    is_candidate_holder(process.name(), process.cmd(), &self.process_name, path)
                })
                .map(|(pid, _)| pid.as_u32())
                .collect();
            pids.sort_unstable();

            debug!(
                process_name = %self.process_name,
                ?pids,
                "process table scan finished"
            );
            Ok(pids)
        })
    }
}

/// Pick the best available lookup for this host.
pub fn detect_lookup(process_name: &str) -> Box<dyn HolderLookup> {
    if cfg!(unix) && command_on_path("lsof") {
        Box::new(LsofLookup)
    } else {
        Box::new(ProcessTableLookup::new(process_name))
    }
}

/// Parse `lsof -t` style output: one pid per line, junk ignored.
pub fn parse_pid_lines(output: &str) -> Vec<u32> {
    let mut pids: Vec<u32> = output
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect();
    pids.sort_unstable();
    pids.dedup();
    pids
}

/// Whether a process looks like it holds `path`: its executable name starts
/// with `wanted_name` (so `python3.11` matches `python`) and one of its
/// arguments names the file.
pub fn is_candidate_holder(name: &str, cmd: &[String], wanted_name: &str, path: &Path) -> bool {
    if !name.starts_with(wanted_name) {
        return false;
    }
    let needle = path.to_string_lossy();
    cmd.iter()
        .any(|arg| Path::new(arg) == path || arg.contains(needle.as_ref()))
}
