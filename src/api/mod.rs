//! HTTP API module - REST endpoints

mod auth;
mod characters;
mod chat;
mod games;
mod oracle;
mod rules;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::db::Database;
use crate::oracle::OracleClient;
use crate::store::{SqliteStore, StoreError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub store: Arc<SqliteStore>,
    pub oracle: Arc<OracleClient>,
    pub invite_code_length: usize,
}

/// Build the API router
pub fn router(db: Arc<Database>, config: &Config) -> Router {
    let store = Arc::new(SqliteStore::new(db.clone()));
    let oracle = OracleClient::shared(config.oracle.clone());

    let state = AppState {
        db,
        store,
        oracle,
        invite_code_length: config.invite_code_length,
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .nest(
            "/api",
            Router::new()
                .merge(auth::router())
                .merge(games::router())
                .merge(characters::router())
                .merge(chat::router())
                .merge(oracle::router())
                .merge(rules::router()),
        )
        .fallback(not_found)
        .with_state(state)
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// JSON error body with a status
pub(crate) fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// Map a store failure to a response
pub(crate) fn store_error(e: StoreError) -> Response {
    match e {
        StoreError::NotFound(what) => error_response(StatusCode::NOT_FOUND, format!("{} not found", what)),
        StoreError::InviteCodeTaken(code) => error_response(
            StatusCode::CONFLICT,
            format!("Invite code {} is already in use", code),
        ),
        e => {
            warn!("Store error: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "tavernd",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy",
                database: "ok",
            }),
        ),
        Err(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                status: "unhealthy",
                database: "error",
            }),
        ),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}
