//! Fake implementations of the supervisor's seams.
//!
//! Each fake records what it was asked to do behind an `Arc<Mutex<..>>`, so
//! a test can keep a clone and inspect it after handing the fake over.

use std::collections::VecDeque;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use swarm_supervisor::auth::{ActivationStatusSource, AuthServiceLauncher};
use swarm_supervisor::cleanup::GroupSignaller;
use swarm_supervisor::errors::{Result, SupervisorError};
use swarm_supervisor::lock::{HolderLookup, IdentityResource, LockRelease, Terminator};
use swarm_supervisor::worker::{WorkerBackend, WorkerExit, WorkerInvocation};

/// Worker backend that replays a script of exits and records every launch.
///
/// When the script runs out, further launches fail with exit code 1.
#[derive(Clone, Default)]
pub struct ScriptedWorker {
    script: Arc<Mutex<VecDeque<Result<WorkerExit>>>>,
    pub launches: Arc<Mutex<Vec<(Instant, WorkerInvocation)>>>,
}

impl ScriptedWorker {
    pub fn new(script: impl IntoIterator<Item = WorkerExit>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().map(Ok).collect())),
            launches: Arc::default(),
        }
    }

    /// Next launch fails to start at all.
    pub fn push_launch_error(&self, msg: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(SupervisorError::WorkerLaunchFailure(msg.to_string())));
    }

    pub fn push_exit(&self, exit: WorkerExit) {
        self.script.lock().unwrap().push_back(Ok(exit));
    }

    pub fn launch_count(&self) -> usize {
        self.launches.lock().unwrap().len()
    }

    pub fn launch_times(&self) -> Vec<Instant> {
        self.launches.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl WorkerBackend for ScriptedWorker {
    fn launch(
        &mut self,
        invocation: WorkerInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerExit>> + Send + '_>> {
        let script = Arc::clone(&self.script);
        let launches = Arc::clone(&self.launches);
        Box::pin(async move {
            launches.lock().unwrap().push((Instant::now(), invocation));
            let next = script.lock().unwrap().pop_front();
            next.unwrap_or(Ok(WorkerExit::Failed(1)))
        })
    }
}

/// Lock release that only records the resources it was asked to free.
#[derive(Clone, Default)]
pub struct RecordingLock {
    pub released: Arc<Mutex<Vec<(Instant, IdentityResource)>>>,
}

impl RecordingLock {
    pub fn release_count(&self) -> usize {
        self.released.lock().unwrap().len()
    }
}

impl LockRelease for RecordingLock {
    fn release<'a>(
        &'a self,
        resource: &'a IdentityResource,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move {
            self.released
                .lock()
                .unwrap()
                .push((Instant::now(), resource.clone()));
        })
    }
}

/// Holder lookup returning a fixed pid list (or an error).
#[derive(Clone)]
pub struct FixedHolders {
    pids: Option<Vec<u32>>,
    pub queried: Arc<Mutex<u32>>,
}

impl FixedHolders {
    pub fn new(pids: Vec<u32>) -> Self {
        Self {
            pids: Some(pids),
            queried: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            pids: None,
            queried: Arc::default(),
        }
    }

    pub fn query_count(&self) -> u32 {
        *self.queried.lock().unwrap()
    }
}

impl HolderLookup for FixedHolders {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn holders<'a>(
        &'a self,
        _path: &'a Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Vec<u32>>> + Send + 'a>> {
        Box::pin(async move {
            *self.queried.lock().unwrap() += 1;
            self.pids
                .clone()
                .ok_or_else(|| anyhow::anyhow!("lookup unavailable"))
        })
    }
}

/// Terminator that records pids; pids listed in `gone` fail like `ESRCH`.
#[derive(Clone, Default)]
pub struct RecordingTerminator {
    gone: Vec<u32>,
    pub terminated: Arc<Mutex<Vec<u32>>>,
}

impl RecordingTerminator {
    pub fn with_gone(gone: Vec<u32>) -> Self {
        Self {
            gone,
            terminated: Arc::default(),
        }
    }

    pub fn terminated(&self) -> Vec<u32> {
        self.terminated.lock().unwrap().clone()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, pid: u32) -> anyhow::Result<()> {
        self.terminated.lock().unwrap().push(pid);
        if self.gone.contains(&pid) {
            anyhow::bail!("no such process");
        }
        Ok(())
    }
}

/// Status source replaying scripted bodies; repeats the last one forever.
#[derive(Clone)]
pub struct ScriptedStatus {
    bodies: Arc<Mutex<VecDeque<anyhow::Result<String>>>>,
    pub calls: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl ScriptedStatus {
    pub fn new(bodies: &[&str]) -> Self {
        Self {
            bodies: Arc::new(Mutex::new(
                bodies.iter().map(|b| Ok(b.to_string())).collect(),
            )),
            calls: Arc::default(),
        }
    }

    /// Queue a transport error before the scripted bodies.
    pub fn fail_first(self) -> Self {
        self.bodies
            .lock()
            .unwrap()
            .push_front(Err(anyhow::anyhow!("connection refused")));
        self
    }

    pub fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

impl ActivationStatusSource for ScriptedStatus {
    fn fetch_status<'a>(
        &'a self,
        org_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push((Instant::now(), org_id.to_string()));
            let mut bodies = self.bodies.lock().unwrap();
            if bodies.len() > 1 {
                bodies.pop_front().unwrap()
            } else {
                match bodies.front() {
                    Some(Ok(body)) => Ok(body.clone()),
                    Some(Err(e)) => Err(anyhow::anyhow!("{e}")),
                    None => Ok("pending".to_string()),
                }
            }
        })
    }
}

/// Service launcher that starts nothing and counts calls.
#[derive(Clone, Default)]
pub struct NoopLauncher {
    pub fail_start: bool,
    pub fail_browser: bool,
    pub started: Arc<Mutex<u32>>,
    pub browsed: Arc<Mutex<Vec<String>>>,
}

impl AuthServiceLauncher for NoopLauncher {
    fn start(&self) -> anyhow::Result<()> {
        *self.started.lock().unwrap() += 1;
        if self.fail_start {
            anyhow::bail!("yarn: command not found");
        }
        Ok(())
    }

    fn open_browser(&self, url: &str) -> anyhow::Result<()> {
        self.browsed.lock().unwrap().push(url.to_string());
        if self.fail_browser {
            anyhow::bail!("no display");
        }
        Ok(())
    }
}

/// Group signaller that counts how often it was asked to fire.
#[derive(Clone, Default)]
pub struct CountingSignaller {
    pub fail: bool,
    pub calls: Arc<Mutex<u32>>,
}

impl CountingSignaller {
    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

impl GroupSignaller for CountingSignaller {
    fn terminate_group(&self) -> anyhow::Result<()> {
        *self.calls.lock().unwrap() += 1;
        if self.fail {
            anyhow::bail!("EPERM");
        }
        Ok(())
    }
}
