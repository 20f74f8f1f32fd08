//! Oracle pass-through endpoint

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::{error_response, AppState};

/// Rate limit bucket shared by HTTP callers
const API_CALLER: &str = "api";

pub fn router() -> Router<AppState> {
    Router::new().route("/oracle", post(ask))
}

#[derive(Debug, Deserialize)]
pub struct OracleRequest {
    pub question: String,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct OracleResponse {
    pub answer: String,
}

/// Ask the Oracle. Provider failures come back as an apology, not an error.
async fn ask(State(state): State<AppState>, Json(req): Json<OracleRequest>) -> impl IntoResponse {
    if req.question.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "question is required");
    }
    let answer = state
        .oracle
        .ask_as(API_CALLER, req.question.trim(), &req.context)
        .await;
    Json(OracleResponse { answer }).into_response()
}
