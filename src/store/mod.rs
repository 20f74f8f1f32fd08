//! Game persistence
//!
//! The `GameStore` trait is the read/write contract the table controller
//! depends on. Implementations:
//! - `SqliteStore`: the server's database
//! - `MemoryStore`: process-local secondary store
//! - `RemoteStore`: HTTP client of a running server
//! - `FallbackStore`: an ordered chain of the above

mod fallback;
mod memory;
mod remote;
mod sqlite;

use async_trait::async_trait;
use thiserror::Error;

use crate::character::Character;
use crate::chat::ChatMessage;
use crate::session::GameSession;

pub use fallback::FallbackStore;
pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invite code {0} is already in use")]
    InviteCodeTaken(String),

    #[error("no store answered")]
    Unavailable,
}

/// Persistence contract for sessions, characters and chat
#[async_trait]
pub trait GameStore: Send + Sync {
    /// All sessions, newest first
    async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError>;

    /// Insert or replace a session by id
    async fn save_game(&self, game: &GameSession) -> Result<(), StoreError>;

    /// Characters bound to a session
    async fn fetch_characters(&self, session_id: &str) -> Result<Vec<Character>, StoreError>;

    /// Insert or replace a character by id
    async fn save_character(&self, character: &Character) -> Result<(), StoreError>;

    /// Most recent messages of a session, oldest first
    async fn fetch_chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError>;

    /// Append a message, trimming history to the retention limit
    async fn append_chat_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError>;
}
