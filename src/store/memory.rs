//! In-memory store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{GameStore, StoreError};
use crate::character::Character;
use crate::chat::{ChatLog, ChatMessage};
use crate::session::{reference_sessions, GameSession};

/// Process-local store, used as the secondary in a fallback chain
#[derive(Default)]
pub struct MemoryStore {
    games: RwLock<Vec<GameSession>>,
    characters: RwLock<Vec<Character>>,
    chats: RwLock<HashMap<String, ChatLog>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the reference sessions
    pub fn seeded() -> Self {
        Self {
            games: RwLock::new(reference_sessions()),
            ..Self::default()
        }
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError> {
        Ok(self.games.read().await.clone())
    }

    async fn save_game(&self, game: &GameSession) -> Result<(), StoreError> {
        let mut games = self.games.write().await;
        match games.iter_mut().find(|g| g.id == game.id) {
            Some(existing) => *existing = game.clone(),
            None => games.insert(0, game.clone()),
        }
        Ok(())
    }

    async fn fetch_characters(&self, session_id: &str) -> Result<Vec<Character>, StoreError> {
        let characters = self.characters.read().await;
        Ok(characters
            .iter()
            .filter(|c| c.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn save_character(&self, character: &Character) -> Result<(), StoreError> {
        let mut characters = self.characters.write().await;
        match characters.iter_mut().find(|c| c.id == character.id) {
            Some(existing) => *existing = character.clone(),
            None => characters.push(character.clone()),
        }
        Ok(())
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let chats = self.chats.read().await;
        Ok(chats.get(session_id).map(ChatLog::to_vec).unwrap_or_default())
    }

    async fn append_chat_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        let mut chats = self.chats.write().await;
        chats
            .entry(session_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }
}
