//! Common test utilities - TavernTest harness for end-to-end testing

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tavernd::{Config, Server};
use tokio::task::JoinHandle;

/// Test harness that spawns a real tavernd server on a random port
pub struct TavernTest {
    pub addr: SocketAddr,
    pub client: Client,
    server: Arc<Server>,
    _handle: JoinHandle<()>,
}

impl TavernTest {
    /// Start a new test server instance
    pub async fn start() -> Result<Self> {
        // Find a random available port
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        drop(listener);

        let config = Config {
            bind_addr: addr,
            db_path: None, // In-memory for tests
            ..Config::default()
        };

        let server = Arc::new(Server::new(config).await?);
        let server_clone = server.clone();

        // Spawn the server in a background task
        let handle = tokio::spawn(async move {
            if let Err(e) = server_clone.run().await {
                eprintln!("Server error: {}", e);
            }
        });

        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;

        // Poll until server is ready (max 2 seconds)
        let mut ready = false;
        for _ in 0..20 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if client
                .get(format!("http://{}/health", addr))
                .send()
                .await
                .is_ok()
            {
                ready = true;
                break;
            }
        }

        if !ready {
            panic!("Server failed to start within 2 seconds");
        }

        Ok(Self {
            addr,
            client,
            server,
            _handle: handle,
        })
    }

    /// Get the base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<reqwest::Response> {
        Ok(self
            .client
            .get(format!("{}{}", self.base_url(), path))
            .send()
            .await?)
    }

    /// Make a POST request with JSON body
    pub async fn post<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .post(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Make a PUT request with JSON body
    #[allow(dead_code)]
    pub async fn put<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<reqwest::Response> {
        Ok(self
            .client
            .put(format!("{}{}", self.base_url(), path))
            .json(body)
            .send()
            .await?)
    }

    /// Get direct access to the database for test setup/assertions
    #[allow(dead_code)]
    pub fn db(&self) -> Arc<tavernd::db::Database> {
        self.server.db()
    }

    /// Shutdown the server gracefully
    #[allow(dead_code)]
    pub fn shutdown(&self) {
        self.server.shutdown();
    }

    /// Create a session through the API and return it
    pub async fn create_game(&self, name: &str, system_id: &str) -> Result<serde_json::Value> {
        let resp = self
            .post(
                "/api/games",
                &serde_json::json!({
                    "name": name,
                    "systemId": system_id,
                    "gmId": "gm-test",
                    "gmName": "Test GM",
                }),
            )
            .await?;
        anyhow::ensure!(
            resp.status().is_success(),
            "create_game failed: {}",
            resp.status()
        );
        Ok(resp.json().await?)
    }
}
