//! Chat endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use super::{store_error, AppState};
use crate::chat::ChatMessage;
use crate::store::GameStore;

pub fn router() -> Router<AppState> {
    Router::new().route("/games/{id}/chat", get(history).post(append))
}

/// Recent messages, oldest first
async fn history(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.store.fetch_chat_history(&id).await {
        Ok(messages) => Json(messages).into_response(),
        Err(e) => store_error(e),
    }
}

/// Append a message
async fn append(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(message): Json<ChatMessage>,
) -> impl IntoResponse {
    match state.store.append_chat_message(&id, &message).await {
        Ok(()) => (StatusCode::CREATED, Json(message)).into_response(),
        Err(e) => store_error(e),
    }
}
