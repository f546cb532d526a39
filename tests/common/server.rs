//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own cache database and its own
//! mock upstream services.

use super::constants::*;
use super::upstream::MockUpstream;
use diddymeter_server::blacklist::{BlacklistSource, StaticBlacklistSource};
use diddymeter_server::cache_store::SqliteCacheStore;
use diddymeter_server::gateway::{CacheGateway, RequestThrottle};
use diddymeter_server::musicbrainz::{
    MusicBrainzClient, MusicBrainzConfig, MusicBrainzResolver, RetryPolicy,
};
use diddymeter_server::pipeline::{PipelineSettings, TrackPipeline};
use diddymeter_server::server::{make_app, RequestsLoggingLevel, ServerConfig, ServerState};
use diddymeter_server::spotify::{SpotifyClient, SpotifyClientConfig};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance backed by a mock Spotify and MusicBrainz
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The fake upstream services, for request counts and failure injection
    pub upstream: MockUpstream,

    // Private fields - keep resources alive until drop
    _temp_db_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a new test server on a random port with the built-in blacklist
    ///
    /// # Panics
    ///
    /// Panics if the cache database cannot be created, port binding fails or
    /// the server doesn't become ready within timeout.
    pub async fn spawn() -> Self {
        Self::spawn_with_blacklist(Arc::new(StaticBlacklistSource::default())).await
    }

    pub async fn spawn_with_blacklist(blacklist: Arc<dyn BlacklistSource>) -> Self {
        let upstream = MockUpstream::spawn().await;

        let temp_db_dir = TempDir::new().expect("Failed to create temp dir");
        let cache_store = Arc::new(
            SqliteCacheStore::new(temp_db_dir.path().join("cache.db"))
                .expect("Failed to open cache store"),
        );
        let gateway = Arc::new(CacheGateway::new(
            cache_store,
            Arc::new(RequestThrottle::unlimited()),
        ));

        let spotify = SpotifyClient::new(SpotifyClientConfig {
            api_base_url: upstream.spotify_api_url(),
            accounts_base_url: upstream.accounts_url(),
            ..SpotifyClientConfig::new(CLIENT_ID.to_string(), CLIENT_SECRET.to_string())
        })
        .expect("Failed to create Spotify client");

        let musicbrainz = MusicBrainzClient::new(
            MusicBrainzConfig {
                base_url: upstream.musicbrainz_url(),
                ..Default::default()
            },
            RetryPolicy {
                initial_backoff: TEST_INITIAL_BACKOFF,
                ..Default::default()
            },
            gateway.clone(),
        )
        .expect("Failed to create MusicBrainz client");

        let pipeline = Arc::new(TrackPipeline::new(
            Arc::new(spotify),
            Arc::new(MusicBrainzResolver::new(musicbrainz, gateway.clone())),
            blacklist.clone(),
            PipelineSettings::default(),
        ));

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
            metrics_port: 0,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
        };
        let state = ServerState::new(config.clone(), pipeline, gateway, blacklist);
        let app = make_app(config, state);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            upstream,
            _temp_db_dir: temp_db_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the home endpoint
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

            match client.get(format!("{}/", self.base_url)).send().await {
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
        // Send shutdown signal
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
