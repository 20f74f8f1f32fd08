//! tavernd - virtual tabletop server daemon
//!
//! Game sessions with a shared chat, dice rolls, character sheets for
//! several rules systems, an initiative tracker for the game master and
//! an AI rules assistant (the Oracle).

pub mod api;
pub mod character;
pub mod chat;
pub mod combat;
pub mod config;
pub mod db;
pub mod init;
pub mod oracle;
pub mod rules;
pub mod session;
pub mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub use config::Config;
use db::Database;

/// The tavernd server instance
pub struct Server {
    config: Config,
    db: Arc<Database>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(config.db_path.as_deref()).await?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            db: Arc::new(db),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get the database handle
    pub fn db(&self) -> Arc<Database> {
        self.db.clone()
    }

    /// Build the router
    fn router(&self) -> Router {
        api::router(self.db.clone(), &self.config).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("tavernd listening on {}", local_addr);

        let router = self.router();
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("tavernd shutdown complete");
        Ok(())
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
