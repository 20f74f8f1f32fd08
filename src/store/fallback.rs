//! Ordered store chain
//!
//! Reads are served by the first store that answers. Writes go to every
//! store and succeed if any of them accepted. Failures are logged and never
//! surfaced while some store still works. Concurrent writers are last write
//! wins.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{GameStore, StoreError};
use crate::character::Character;
use crate::chat::ChatMessage;
use crate::session::GameSession;

pub struct FallbackStore {
    chain: Vec<Arc<dyn GameStore>>,
}

impl FallbackStore {
    /// Build a chain, primary first
    pub fn new(chain: Vec<Arc<dyn GameStore>>) -> Self {
        Self { chain }
    }

    /// Primary store backed by a secondary
    pub fn pair(primary: Arc<dyn GameStore>, secondary: Arc<dyn GameStore>) -> Self {
        Self::new(vec![primary, secondary])
    }

    async fn write_all<'a, F, Fut>(&'a self, what: &str, op: F) -> Result<(), StoreError>
    where
        F: Fn(&'a Arc<dyn GameStore>) -> Fut,
        Fut: std::future::Future<Output = Result<(), StoreError>>,
    {
        let mut accepted = false;
        let mut last_err = None;
        for (i, store) in self.chain.iter().enumerate() {
            match op(store).await {
                Ok(()) => accepted = true,
                Err(e) => {
                    warn!("Store {} failed to {}: {}", i, what, e);
                    last_err = Some(e);
                }
            }
        }
        if accepted {
            Ok(())
        } else {
            Err(last_err.unwrap_or(StoreError::Unavailable))
        }
    }
}

#[async_trait]
impl GameStore for FallbackStore {
    async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError> {
        let mut last_err = None;
        for (i, store) in self.chain.iter().enumerate() {
            match store.fetch_games().await {
                Ok(games) => {
                    // Mirror the answer into the stores behind it, oldest
                    // first so new entries end up newest first there too
                    for mirror in &self.chain[i + 1..] {
                        for game in games.iter().rev() {
                            if let Err(e) = mirror.save_game(game).await {
                                debug!("Could not mirror game {}: {}", game.id, e);
                            }
                        }
                    }
                    return Ok(games);
                }
                Err(e) => {
                    warn!("Store {} failed to fetch games: {}", i, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(StoreError::Unavailable))
    }

    async fn save_game(&self, game: &GameSession) -> Result<(), StoreError> {
        self.write_all("save game", |s| s.save_game(game)).await
    }

    async fn fetch_characters(&self, session_id: &str) -> Result<Vec<Character>, StoreError> {
        let mut last_err = None;
        for (i, store) in self.chain.iter().enumerate() {
            match store.fetch_characters(session_id).await {
                Ok(characters) => return Ok(characters),
                Err(e) => {
                    warn!("Store {} failed to fetch characters: {}", i, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(StoreError::Unavailable))
    }

    async fn save_character(&self, character: &Character) -> Result<(), StoreError> {
        self.write_all("save character", |s| s.save_character(character))
            .await
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let mut last_err = None;
        for (i, store) in self.chain.iter().enumerate() {
            match store.fetch_chat_history(session_id).await {
                Ok(history) => return Ok(history),
                Err(e) => {
                    warn!("Store {} failed to fetch chat: {}", i, e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(StoreError::Unavailable))
    }

    async fn append_chat_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        self.write_all("append chat message", |s| {
            s.append_chat_message(session_id, message)
        })
        .await
    }
}
