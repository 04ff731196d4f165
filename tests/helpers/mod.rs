#![allow(dead_code)]
//! Shared fixtures for integration tests: a notifier that records its
//! calls, and a harness that runs the full HTTP server on an ephemeral
//! port over a temp-dir store.

use async_trait::async_trait;
use clipwatch::contacts::ContactRegistry;
use clipwatch::core::{ContactEntry, DispatchOutcome, Notifier};
use clipwatch::ingest::IngestService;
use clipwatch::server::{AlertServer, AppState};
use clipwatch::storage::FileAlertStore;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// A test notifier that records every call and returns a fixed outcome.
pub struct RecordingNotifier {
    outcome: DispatchOutcome,
    calls: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn with_outcome(outcome: DispatchOutcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn simulated() -> Arc<Self> {
        Self::with_outcome(DispatchOutcome::Simulated)
    }

    /// A notifier whose every call fails, for notification-isolation tests.
    pub fn failing() -> Arc<Self> {
        Self::with_outcome(DispatchOutcome::Failed("forced failure".to_string()))
    }

    /// The `(contact, message)` pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Polls until at least `n` calls were recorded or the timeout passes.
    /// Returns whether the count was reached (dispatch runs on a spawned
    /// task, so tests must wait rather than assert immediately).
    pub async fn wait_for_calls(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.calls.lock().unwrap().len() >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.calls.lock().unwrap().len() >= n
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, contact: &str, message: &str) -> DispatchOutcome {
        self.calls
            .lock()
            .unwrap()
            .push((contact.to_string(), message.to_string()));
        self.outcome.clone()
    }
}

/// A registry with the canonical test device registered.
pub fn pc01_registry() -> ContactRegistry {
    ContactRegistry::from_entries([(
        "PC-01".to_string(),
        ContactEntry {
            guardian: "+911111111111".to_string(),
            police: "+912222222222".to_string(),
        },
    )])
}

/// A running instance of the intake server for HTTP-level tests.
pub struct TestApp {
    pub addr: SocketAddr,
    pub store: Arc<FileAlertStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
    _dir: TempDir,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn shutdown(self) {
        self.shutdown_tx.send(true).ok();
        let _ = self.handle.await;
    }
}

/// Binds the server to an ephemeral port over a fresh temp-dir store.
pub async fn spawn_app(registry: ContactRegistry, notifier: Arc<RecordingNotifier>) -> TestApp {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let store =
        Arc::new(FileAlertStore::open(dir.path().join("alerts")).expect("failed to open store"));
    let ingest = Arc::new(IngestService::new(
        store.clone(),
        Arc::new(registry),
        notifier.clone(),
    ));
    let state = AppState {
        ingest,
        store: store.clone(),
    };

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = AlertServer::new(listener, state, shutdown_rx);
    let addr = server.local_addr().expect("no local addr");
    let handle = tokio::spawn(server.run());

    TestApp {
        addr,
        store,
        notifier,
        shutdown_tx,
        handle,
        _dir: dir,
    }
}
