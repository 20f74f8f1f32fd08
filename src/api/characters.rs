//! Character endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use super::{error_response, store_error, AppState};
use crate::character::Character;
use crate::store::GameStore;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games/{id}/characters", get(list_characters))
        .route("/characters", post(save_character))
}

/// Roster of a session
async fn list_characters(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.store.fetch_characters(&id).await {
        Ok(characters) => Json(characters).into_response(),
        Err(e) => store_error(e),
    }
}

/// Insert or replace a character
async fn save_character(
    State(state): State<AppState>,
    Json(character): Json<Character>,
) -> impl IntoResponse {
    if character.id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "character id is required");
    }
    if character.session_id.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "sessionId is required");
    }
    match state.store.save_character(&character).await {
        Ok(()) => Json(character).into_response(),
        Err(e) => store_error(e),
    }
}
