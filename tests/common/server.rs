//! Test server lifecycle management
//!
//! Each test gets an isolated server with its own snapshot database.

use super::constants::*;
use super::fixtures::{seed_snapshot, ScriptedSource};
use epimap_server::background_jobs::jobs::ScrapeDashboardJob;
use epimap_server::background_jobs::{create_scheduler, JobContext, SchedulerHandle};
use epimap_server::chart::ChartBuilder;
use epimap_server::server::state::ServerState;
use epimap_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use epimap_server::snapshot_store::{SnapshotStore, SqliteSnapshotStore};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Test server instance with an isolated database
///
/// When dropped, the server and its scheduler shut down and the temp
/// directory is removed.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// Store for direct database access in tests
    pub snapshot_store: Arc<dyn SnapshotStore>,

    /// Present when spawned with a scheduler
    #[allow(dead_code)]
    pub scheduler_handle: Option<SchedulerHandle>,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    shutdown_token: CancellationToken,
}

impl TestServer {
    /// Spawns a server over a seeded database, without a scheduler
    #[allow(dead_code)]
    pub async fn spawn() -> Self {
        Self::spawn_inner(true, None).await
    }

    /// Spawns a server over an empty database, without a scheduler
    #[allow(dead_code)]
    pub async fn spawn_empty() -> Self {
        Self::spawn_inner(false, None).await
    }

    /// Spawns a server over a seeded database whose scheduler runs the
    /// scrape job against `source`. The job never fires on its own during a
    /// test; use the trigger endpoint.
    #[allow(dead_code)]
    pub async fn spawn_with_scheduler(source: ScriptedSource) -> Self {
        Self::spawn_inner(true, Some(source)).await
    }

    async fn spawn_inner(seed: bool, source: Option<ScriptedSource>) -> Self {
        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let snapshot_store: Arc<dyn SnapshotStore> = Arc::new(
            SqliteSnapshotStore::new(temp_db_dir.path().join("data.db"))
                .expect("Failed to open snapshot store"),
        );
        if seed {
            seed_snapshot(snapshot_store.as_ref()).expect("Failed to seed snapshot");
        }

        let shutdown_token = CancellationToken::new();

        let scheduler_handle = match source {
            Some(source) => {
                let job_context =
                    JobContext::new(shutdown_token.child_token(), snapshot_store.clone());
                let (mut scheduler, handle) =
                    create_scheduler(shutdown_token.clone(), job_context);
                let job = ScrapeDashboardJob::new(
                    Arc::new(source),
                    Duration::from_secs(12 * 3600),
                    None,
                    false,
                );
                scheduler.register_job(Arc::new(job)).await;
                tokio::spawn(async move {
                    scheduler.run().await;
                });
                Some(handle)
            }
            None => None,
        };

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");

        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let base_url = format!("http://127.0.0.1:{}", port);

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            ..Default::default()
        };
        let state = ServerState::new(
            config,
            snapshot_store.clone(),
            ChartBuilder::default(),
            scheduler_handle.clone(),
        );
        let app = make_app(state);

        // Spawn server in background task with graceful shutdown
        let server_shutdown = shutdown_token.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { server_shutdown.cancelled().await })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            snapshot_store,
            scheduler_handle,
            _temp_db_dir: temp_db_dir,
            shutdown_token,
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /status endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/status", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown_token.cancel();
    }
}
