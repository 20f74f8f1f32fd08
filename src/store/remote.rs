//! HTTP client store talking to a running tavernd server

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::{GameStore, StoreError};
use crate::character::Character;
use crate::chat::ChatMessage;
use crate::session::GameSession;

pub struct RemoteStore {
    client: Client,
    api_url: String,
}

impl RemoteStore {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3001`
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: format!("{}/api", base_url.trim_end_matches('/')),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            Err(StoreError::Status(response.status().as_u16()))
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, StoreError> {
        debug!("GET {}", path);
        let response = self.client.get(self.url(path)).send().await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn post<B: Serialize + ?Sized + Sync>(&self, path: &str, body: &B) -> Result<(), StoreError> {
        debug!("POST {}", path);
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::check(response)?;
        Ok(())
    }
}

#[async_trait]
impl GameStore for RemoteStore {
    async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError> {
        self.get("/games").await
    }

    async fn save_game(&self, game: &GameSession) -> Result<(), StoreError> {
        self.post("/games", game).await
    }

    async fn fetch_characters(&self, session_id: &str) -> Result<Vec<Character>, StoreError> {
        self.get(&format!("/games/{}/characters", session_id)).await
    }

    async fn save_character(&self, character: &Character) -> Result<(), StoreError> {
        self.post("/characters", character).await
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        self.get(&format!("/games/{}/chat", session_id)).await
    }

    async fn append_chat_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        self.post(&format!("/games/{}/chat", session_id), message)
            .await
    }
}
