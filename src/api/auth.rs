//! Login endpoint
//!
//! There are no credentials: logging in gets or creates the user by name.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::Deserialize;

use super::{error_response, store_error, AppState};
use crate::session::User;

/// Build auth router
pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Login request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Get or create a user by username
async fn login(State(state): State<AppState>, Json(req): Json<LoginRequest>) -> impl IntoResponse {
    let username = req.username.trim();
    if username.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "username is required");
    }

    let user = User {
        id: req.id.unwrap_or_default(),
        username: username.to_string(),
        email: req.email,
        avatar_url: req.avatar_url.unwrap_or_default(),
    };

    match state.store.login(&user).await {
        Ok(user) => (StatusCode::OK, Json(user)).into_response(),
        Err(e) => store_error(e),
    }
}
