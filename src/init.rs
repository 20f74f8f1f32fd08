//! Database initialization module
//!
//! Provides one-time database setup functionality for the tavernd_init tool.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use crate::db::Database;
use crate::session::reference_sessions;
use crate::store::{GameStore, SqliteStore};

/// Initialize a new server database
///
/// # Arguments
/// * `path` - Path to the SQLite database file (must not exist)
/// * `seed` - Store the reference sessions
///
/// # Errors
/// * Database file already exists
/// * Database creation fails
pub async fn init_database(path: &Path, seed: bool) -> Result<()> {
    // Fail if database already exists
    if path.exists() {
        bail!(
            "Database file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    info!("Creating new database at {}", path.display());

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Database path is not valid UTF-8: {}", path.display()))?;

    // Create the database (runs migrations)
    let db = std::sync::Arc::new(Database::new(Some(path_str)).await?);

    if seed {
        let store = SqliteStore::new(db.clone());
        for game in reference_sessions() {
            store.save_game(&game).await?;
            info!("Seeded session '{}' ({})", game.name, game.invite_code);
        }
    }

    db.pool().close().await;
    info!("Database initialization complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_seeds_reference_sessions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tavern.db");

        init_database(&path, true).await.unwrap();
        assert!(path.exists());

        let db = std::sync::Arc::new(Database::new(path.to_str()).await.unwrap());
        let store = SqliteStore::new(db);
        let games = store.fetch_games().await.unwrap();
        assert_eq!(games.len(), 2);
        assert!(store
            .find_game_by_invite_code("rubi456")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_init_without_seed_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");

        init_database(&path, false).await.unwrap();
        let db = std::sync::Arc::new(Database::new(path.to_str()).await.unwrap());
        assert!(SqliteStore::new(db).fetch_games().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_init_refuses_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exists.db");
        std::fs::write(&path, b"").unwrap();

        let err = init_database(&path, true).await.unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }
}
