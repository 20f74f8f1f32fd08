//! SQLite-backed store used by the server

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;
use tracing::debug;

use super::{GameStore, StoreError};
use crate::character::Character;
use crate::chat::{ChatMessage, CHAT_HISTORY_LIMIT};
use crate::db::Database;
use crate::session::{
    default_avatar_url, normalize_invite_code, unique_invite_code, GameSession, User,
    DEFAULT_INVITE_CODE_LENGTH,
};

/// Row of the games table
#[derive(Debug, sqlx::FromRow)]
struct GameRow {
    id: String,
    name: String,
    system_id: String,
    gm_id: String,
    gm_name: String,
    player_count: i64,
    next_session: Option<String>,
    description: String,
    banner_url: Option<String>,
    invite_code: String,
}

impl GameRow {
    fn into_session(self) -> GameSession {
        GameSession {
            id: self.id,
            name: self.name,
            system_id: self.system_id,
            gm_id: self.gm_id,
            gm_name: self.gm_name,
            player_count: self.player_count.max(0) as u32,
            next_session: self.next_session,
            description: self.description,
            banner_url: self.banner_url,
            invite_code: self.invite_code,
        }
    }
}

const GAME_COLUMNS: &str = "id, name, system_id, gm_id, gm_name, player_count, next_session, \
                            description, banner_url, invite_code";

/// Store over the server database
pub struct SqliteStore {
    db: Arc<Database>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        self.db.pool()
    }

    /// Get a session by id
    pub async fn get_game(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        let row: Option<GameRow> =
            sqlx::query_as(&format!("SELECT {} FROM games WHERE id = ?", GAME_COLUMNS))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(GameRow::into_session))
    }

    /// Look up a session by invite code, ignoring case
    pub async fn find_game_by_invite_code(
        &self,
        code: &str,
    ) -> Result<Option<GameSession>, StoreError> {
        let row: Option<GameRow> = sqlx::query_as(&format!(
            "SELECT {} FROM games WHERE invite_code = ?",
            GAME_COLUMNS
        ))
        .bind(normalize_invite_code(code))
        .fetch_optional(self.pool())
        .await?;
        Ok(row.map(GameRow::into_session))
    }

    /// Id of the session holding an invite code, if any
    pub async fn invite_code_owner(&self, code: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM games WHERE invite_code = ?")
            .bind(normalize_invite_code(code))
            .fetch_optional(self.pool())
            .await?;
        Ok(row.map(|(id,)| id))
    }

    /// Pick an invite code no stored session uses
    pub async fn fresh_invite_code(&self, length: usize) -> Result<String, StoreError> {
        let taken: Vec<(String,)> = sqlx::query_as("SELECT invite_code FROM games")
            .fetch_all(self.pool())
            .await?;
        let taken: Vec<String> = taken.into_iter().map(|(code,)| code).collect();

        unique_invite_code(&mut rand::rng(), length, |code| {
            taken.iter().any(|t| t == code)
        })
        .ok_or_else(|| StoreError::InviteCodeTaken("<generated>".to_string()))
    }

    /// Insert or replace a session, rejecting an invite code owned by another session
    pub async fn upsert_game(&self, game: &GameSession) -> Result<GameSession, StoreError> {
        let mut game = game.clone();
        game.invite_code = normalize_invite_code(&game.invite_code);
        if game.invite_code.is_empty() {
            game.invite_code = self.fresh_invite_code(DEFAULT_INVITE_CODE_LENGTH).await?;
        }

        if let Some(owner) = self.invite_code_owner(&game.invite_code).await? {
            if owner != game.id {
                return Err(StoreError::InviteCodeTaken(game.invite_code));
            }
        }

        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        sqlx::query(
            r#"
            INSERT INTO games (id, name, system_id, gm_id, gm_name, player_count,
                               next_session, description, banner_url, invite_code, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                system_id = excluded.system_id,
                gm_id = excluded.gm_id,
                gm_name = excluded.gm_name,
                player_count = excluded.player_count,
                next_session = excluded.next_session,
                description = excluded.description,
                banner_url = excluded.banner_url,
                invite_code = excluded.invite_code
            "#,
        )
        .bind(&game.id)
        .bind(&game.name)
        .bind(&game.system_id)
        .bind(&game.gm_id)
        .bind(&game.gm_name)
        .bind(i64::from(game.player_count))
        .bind(&game.next_session)
        .bind(&game.description)
        .bind(&game.banner_url)
        .bind(&game.invite_code)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                StoreError::InviteCodeTaken(game.invite_code.clone())
            }
            e => StoreError::Database(e),
        })?;

        debug!("Saved game {} ({})", game.id, game.invite_code);
        Ok(game)
    }

    /// Merge a partial JSON update into a stored session
    pub async fn update_game(
        &self,
        id: &str,
        updates: serde_json::Value,
    ) -> Result<GameSession, StoreError> {
        let existing = self
            .get_game(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("game {}", id)))?;

        let mut merged = serde_json::to_value(&existing)?;
        if let (Some(target), serde_json::Value::Object(patch)) = (merged.as_object_mut(), updates)
        {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        let mut updated: GameSession = serde_json::from_value(merged)?;
        updated.id = existing.id;

        self.upsert_game(&updated).await
    }

    /// Get or create a user by username
    pub async fn login(&self, user: &User) -> Result<User, StoreError> {
        let row: Option<(String, String, Option<String>, String)> = sqlx::query_as(
            "SELECT id, username, email, avatar_url FROM users WHERE username = ?",
        )
        .bind(&user.username)
        .fetch_optional(self.pool())
        .await?;

        if let Some((id, username, email, avatar_url)) = row {
            return Ok(User {
                id,
                username,
                email,
                avatar_url,
            });
        }

        let created = User {
            id: if user.id.is_empty() {
                uuid::Uuid::new_v4().to_string()
            } else {
                user.id.clone()
            },
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_url: if user.avatar_url.is_empty() {
                default_avatar_url(&user.username)
            } else {
                user.avatar_url.clone()
            },
        };

        sqlx::query("INSERT INTO users (id, username, email, avatar_url) VALUES (?, ?, ?, ?)")
            .bind(&created.id)
            .bind(&created.username)
            .bind(&created.email)
            .bind(&created.avatar_url)
            .execute(self.pool())
            .await?;

        debug!("Created user {} ({})", created.username, created.id);
        Ok(created)
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn fetch_games(&self) -> Result<Vec<GameSession>, StoreError> {
        let rows: Vec<GameRow> = sqlx::query_as(&format!(
            "SELECT {} FROM games ORDER BY created_at DESC, rowid DESC",
            GAME_COLUMNS
        ))
        .fetch_all(self.pool())
        .await?;
        Ok(rows.into_iter().map(GameRow::into_session).collect())
    }

    async fn save_game(&self, game: &GameSession) -> Result<(), StoreError> {
        self.upsert_game(game).await.map(|_| ())
    }

    async fn fetch_characters(&self, session_id: &str) -> Result<Vec<Character>, StoreError> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT data FROM characters WHERE session_id = ? ORDER BY rowid")
                .bind(session_id)
                .fetch_all(self.pool())
                .await?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(StoreError::from))
            .collect()
    }

    async fn save_character(&self, character: &Character) -> Result<(), StoreError> {
        let data = serde_json::to_string(character)?;
        sqlx::query(
            r#"
            INSERT INTO characters (id, session_id, data, updated_at)
            VALUES (?, ?, ?, datetime('now'))
            ON CONFLICT(id) DO UPDATE SET
                session_id = excluded.session_id,
                data = excluded.data,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&character.id)
        .bind(&character.session_id)
        .bind(&data)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    async fn fetch_chat_history(&self, session_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT data FROM (
                SELECT seq, data FROM chat_messages
                WHERE session_id = ?
                ORDER BY seq DESC
                LIMIT ?
            ) ORDER BY seq ASC
            "#,
        )
        .bind(session_id)
        .bind(CHAT_HISTORY_LIMIT as i64)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|(data,)| serde_json::from_str(&data).map_err(StoreError::from))
            .collect()
    }

    async fn append_chat_message(
        &self,
        session_id: &str,
        message: &ChatMessage,
    ) -> Result<(), StoreError> {
        let data = serde_json::to_string(message)?;
        let mut tx = self.pool().begin().await?;

        sqlx::query("INSERT INTO chat_messages (session_id, id, data) VALUES (?, ?, ?)")
            .bind(session_id)
            .bind(&message.id)
            .bind(&data)
            .execute(&mut *tx)
            .await?;

        // Drop everything older than the retention window
        sqlx::query(
            r#"
            DELETE FROM chat_messages
            WHERE session_id = ?1 AND seq NOT IN (
                SELECT seq FROM chat_messages
                WHERE session_id = ?1
                ORDER BY seq DESC
                LIMIT ?2
            )
            "#,
        )
        .bind(session_id)
        .bind(CHAT_HISTORY_LIMIT as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
