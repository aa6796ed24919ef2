//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own model script, catalog and
//! rate limiter.

use super::constants::*;
use super::fakes::{FakeCatalog, ModelReply, ScriptedLlm};
use moodmix_server::persona::PersonaStore;
use moodmix_server::recommendation::{
    InMemoryRateLimiter, PipelineSettings, RecommendationService,
};
use moodmix_server::server::{make_app, RequestsLoggingLevel, ServerConfig};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

/// Knobs for a single test server.
pub struct TestServerOptions {
    pub reply: ModelReply,
    pub rate_limit: u32,
    /// Titles the fake catalog fails to look up.
    pub unknown_titles: Vec<String>,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self {
            reply: ModelReply::Text(MODEL_REPLY_OK.to_string()),
            rate_limit: TEST_RATE_LIMIT,
            unknown_titles: Vec::new(),
        }
    }
}

/// Test server instance with its own recommendation pipeline
///
/// When dropped, the server gracefully shuts down.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// The port the server is listening on
    pub port: u16,

    /// The scripted model, for inspecting prompts sent by the server
    pub llm: Arc<ScriptedLlm>,

    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestServer {
    /// Spawns a test server with the default options
    pub async fn spawn() -> Self {
        Self::spawn_with(TestServerOptions::default()).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Builds the pipeline on top of the scripted model and fake catalog
    /// 2. Binds to a random port (127.0.0.1:0)
    /// 3. Spawns the server in a background task
    /// 4. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if port binding fails or the server doesn't become ready
    /// within timeout.
    pub async fn spawn_with(options: TestServerOptions) -> Self {
        let personas = Arc::new(PersonaStore::builtin().expect("Failed to load personas"));
        let llm = Arc::new(ScriptedLlm::new(options.reply));
        let catalog = Arc::new(FakeCatalog {
            unknown: options.unknown_titles,
        });
        let rate_limiter = Arc::new(InMemoryRateLimiter::new(
            options.rate_limit,
            Duration::from_secs(60),
        ));

        let service = Arc::new(RecommendationService::new(
            llm.clone(),
            catalog,
            rate_limiter,
            personas.clone(),
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

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            frontend_dir_path: None,
            client_id_header: Some(CLIENT_ID_HEADER.to_string()),
        };

        let app = make_app(config, service, personas).expect("Failed to build app");

        // Spawn server in background task with graceful shutdown
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            })
            .await
            .expect("Server failed");
        });

        let server = Self {
            base_url,
            port,
            llm,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the /v1/status endpoint
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

            match client
                .get(format!("{}/v1/status", self.base_url))
                .send()
                .await
            {
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
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
