// tests/session_exit.rs

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use tokio::sync::oneshot;
use tokio::time::sleep;

use swarm_supervisor::auth::HandshakeCoordinator;
use swarm_supervisor::cleanup::ExitHandler;
use swarm_supervisor::fs::FileSystem;
use swarm_supervisor::fs::mock::MockFileSystem;
use swarm_supervisor::supervise;
use swarm_supervisor::supervisor::{RetrySupervisor, Session};
use swarm_supervisor::worker::WorkerExit;
use swarm_supervisor_test_utils::builders::{auth_settings, launch_plan};
use swarm_supervisor_test_utils::fakes::{
    CountingSignaller, NoopLauncher, RecordingLock, ScriptedStatus, ScriptedWorker,
};
use swarm_supervisor_test_utils::init_tracing;

const ARTIFACT_DIR: &str = "modal-login/temp-data";
const ARTIFACT: &str = "modal-login/temp-data/userData.json";

struct Harness {
    fs: MockFileSystem,
    signaller: CountingSignaller,
    handler: Arc<ExitHandler>,
}

impl Harness {
    fn new() -> Self {
        let fs = MockFileSystem::new();
        let signaller = CountingSignaller::default();
        let handler = Arc::new(ExitHandler::new(
            ARTIFACT_DIR,
            Arc::new(fs.clone()),
            Box::new(signaller.clone()),
        ));
        Self {
            fs,
            signaller,
            handler,
        }
    }

    fn assert_cleaned_up(&self) {
        assert!(self.handler.has_fired());
        assert_eq!(self.signaller.calls(), 1);
        assert_eq!(self.fs.file_count(), 0);
    }
}

fn retry_session(
    worker: &ScriptedWorker,
    max_retries: u32,
) -> RetrySupervisor<RecordingLock, ScriptedWorker> {
    RetrySupervisor::new(
        Session::new(max_retries, Duration::from_secs(120)),
        RecordingLock::default(),
        worker.clone(),
        launch_plan("/work/swarm.pem", Some("abc123")),
    )
}

#[tokio::test(start_paused = true)]
async fn worker_success_exits_zero_and_cleans_up() {
    init_tracing();
    let h = Harness::new();
    h.fs.add_file(ARTIFACT, r#"{"orgId":"abc123"}"#);
    let worker = ScriptedWorker::new([WorkerExit::Success]);

    let code = supervise(
        retry_session(&worker, 10).run(),
        std::future::pending::<anyhow::Result<String>>(),
        Arc::clone(&h.handler),
    )
    .await;

    assert_eq!(code, 0);
    h.assert_cleaned_up();
}

#[tokio::test(start_paused = true)]
async fn shutdown_signal_during_backoff_exits_zero_and_cleans_up() {
    init_tracing();
    let h = Harness::new();
    h.fs.add_file(ARTIFACT, r#"{"orgId":"abc123"}"#);
    let worker = ScriptedWorker::new([]);

    let (tx, rx) = oneshot::channel::<&'static str>();
    tokio::spawn(async move {
        sleep(Duration::from_secs(30)).await;
        let _ = tx.send("SIGTERM");
    });
    let shutdown = async move {
        rx.await
            .map(str::to_string)
            .map_err(|_| anyhow!("shutdown sender dropped"))
    };

    let code = supervise(
        retry_session(&worker, 10).run(),
        shutdown,
        Arc::clone(&h.handler),
    )
    .await;

    assert_eq!(code, 0);
    // Interrupted in the first backoff: no second launch.
    assert_eq!(worker.launch_count(), 1);
    h.assert_cleaned_up();
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_exit_one_and_clean_up() {
    init_tracing();
    let h = Harness::new();
    let worker = ScriptedWorker::new([]);

    let code = supervise(
        retry_session(&worker, 2).run(),
        std::future::pending::<anyhow::Result<String>>(),
        Arc::clone(&h.handler),
    )
    .await;

    assert_eq!(code, 1);
    assert_eq!(worker.launch_count(), 2);
    h.assert_cleaned_up();
}

#[tokio::test(start_paused = true)]
async fn invalid_artifact_exits_one_and_removes_it() {
    init_tracing();
    let h = Harness::new();
    h.fs.add_file(ARTIFACT, "{}\n");
    let fs: Arc<dyn FileSystem> = Arc::new(h.fs.clone());
    let coordinator = HandshakeCoordinator::new(
        auth_settings(),
        fs,
        Box::new(NoopLauncher::default()),
        Box::new(ScriptedStatus::new(&["activated"])),
    );

    let code = supervise(
        coordinator.obtain_activated_credential(),
        std::future::pending::<anyhow::Result<String>>(),
        Arc::clone(&h.handler),
    )
    .await;

    assert_eq!(code, 1);
    h.assert_cleaned_up();
}

#[tokio::test(start_paused = true)]
async fn failing_signal_listener_exits_one_and_cleans_up() {
    init_tracing();
    let h = Harness::new();
    let worker = ScriptedWorker::new([]);

    let code = supervise(
        retry_session(&worker, 10).run(),
        async { Err::<String, _>(anyhow!("cannot install signal handlers")) },
        Arc::clone(&h.handler),
    )
    .await;

    assert_eq!(code, 1);
    h.assert_cleaned_up();
}
