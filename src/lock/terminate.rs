// src/lock/terminate.rs

use anyhow::Result;

/// Forcefully terminates a single process.
pub trait Terminator: Send + Sync {
    fn terminate(&self, pid: u32) -> Result<()>;
}

/// Sends `SIGKILL` on unix; uses the process table API elsewhere.
#[derive(Debug, Clone, Default)]
pub struct SignalTerminator;

#[cfg(unix)]
impl Terminator for SignalTerminator {
    fn terminate(&self, pid: u32) -> Result<()> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        #[allow(clippy::cast_possible_wrap)]
        kill(Pid::from_raw(pid as i32), Signal::SIGKILL)?;
        Ok(())
    }
}

#[cfg(not(unix))]
impl Terminator for SignalTerminator {
    fn terminate(&self, pid: u32) -> Result<()> {
        use sysinfo::{Pid, System};

        let mut system = System::new();
        system.refresh_processes();
        match system.process(Pid::from_u32(pid)) {
            Some(process) if process.kill() => Ok(()),
            Some(_) => anyhow::bail!("failed to kill process {pid}"),
            None => anyhow::bail!("no such process {pid}"),
        }
    }
}
