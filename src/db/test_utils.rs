//! Shared test utilities for database operations
//!
//! Stores under test get a fresh in-memory database built by the same
//! migrations as production.

use std::sync::Arc;

use super::Database;

/// Create an in-memory test database with full schema
pub async fn test_db() -> Arc<Database> {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    Arc::new(db)
}
