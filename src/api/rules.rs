//! Rules catalog endpoints

use axum::{response::IntoResponse, routing::get, Json, Router};

use super::AppState;
use crate::rules;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/systems", get(systems))
        .route("/monsters", get(monsters))
        .route("/gear", get(gear))
}

async fn systems() -> impl IntoResponse {
    Json(rules::systems())
}

async fn monsters() -> impl IntoResponse {
    Json(rules::monsters())
}

/// Starting gear shop
async fn gear() -> impl IntoResponse {
    Json(rules::starting_gear())
}
