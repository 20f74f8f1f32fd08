//! Game session endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use tracing::info;

use super::{error_response, store_error, AppState};
use crate::rules;
use crate::session::{is_valid_invite_code, normalize_invite_code, GameSession};
use crate::store::{GameStore, StoreError};

/// Build games router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/games", get(list_games).post(create_game))
        .route("/games/{id}", put(update_game))
        .route("/games/join/{code}", get(join_game))
}

/// List sessions, newest first
async fn list_games(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.fetch_games().await {
        Ok(games) => Json(games).into_response(),
        Err(e) => store_error(e),
    }
}

/// Create (or replace) a session. Missing id and invite code are assigned.
async fn create_game(
    State(state): State<AppState>,
    Json(mut game): Json<GameSession>,
) -> impl IntoResponse {
    if game.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "name is required");
    }
    if rules::system(&game.system_id).is_none() {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("unknown rules system: {}", game.system_id),
        );
    }

    if game.id.is_empty() {
        game.id = uuid::Uuid::new_v4().to_string();
    }

    game.invite_code = normalize_invite_code(&game.invite_code);
    if game.invite_code.is_empty() {
        match state.store.fresh_invite_code(state.invite_code_length).await {
            Ok(code) => game.invite_code = code,
            Err(e) => return store_error(e),
        }
    } else if !is_valid_invite_code(&game.invite_code) {
        return error_response(
            StatusCode::BAD_REQUEST,
            format!("invalid invite code: {}", game.invite_code),
        );
    }

    let existed = match state.store.get_game(&game.id).await {
        Ok(existing) => existing.is_some(),
        Err(e) => return store_error(e),
    };

    match state.store.upsert_game(&game).await {
        Ok(saved) => {
            info!("Saved game {} with invite code {}", saved.id, saved.invite_code);
            let status = if existed {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            (status, Json(saved)).into_response()
        }
        Err(e) => store_error(e),
    }
}

/// Merge a partial update into a session
async fn update_game(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(updates): Json<serde_json::Value>,
) -> impl IntoResponse {
    if !updates.is_object() {
        return error_response(StatusCode::BAD_REQUEST, "expected a JSON object");
    }
    match state.store.update_game(&id, updates).await {
        Ok(game) => Json(game).into_response(),
        Err(StoreError::NotFound(_)) => error_response(StatusCode::NOT_FOUND, "Game not found"),
        Err(e) => store_error(e),
    }
}

/// Look up a session by invite code
async fn join_game(State(state): State<AppState>, Path(code): Path<String>) -> impl IntoResponse {
    let code = normalize_invite_code(&code);
    match state.store.find_game_by_invite_code(&code).await {
        Ok(Some(game)) => Json(game).into_response(),
        Ok(None) => error_response(
            StatusCode::NOT_FOUND,
            format!("No session found for invite code {}", code),
        ),
        Err(e) => store_error(e),
    }
}
