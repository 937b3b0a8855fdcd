//! Bootstrap schema for SQLite
//!
//! Mirrors the columns the repository reads from the PostgreSQL deployment:
//! - `workspaces`: only `id` and `name` are used, for the `default` row
//! - `hosts`: every scalar column nullable except `workspace_id`
//!
//! This is a fixture for embedded use, not a migration system.

use super::SqliteHostStore;
use crate::error::StorageError;
use crate::types::{DEFAULT_WORKSPACE_ID, DEFAULT_WORKSPACE_NAME};

/// Create the tables and the default workspace if missing
pub async fn initialize_schema(store: &SqliteHostStore) -> Result<(), StorageError> {
    let mut conn = store.pool().acquire().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS workspaces (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE
        )
        "#,
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| StorageError::query("failed to create workspaces table", e))?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS hosts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            workspace_id INTEGER NOT NULL,
            address TEXT,
            name TEXT,
            state TEXT,
            comments TEXT
        )
        "#,
    )
    .execute(&mut *conn)
    .await
    .map_err(|e| StorageError::query("failed to create hosts table", e))?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_hosts_workspace ON hosts(workspace_id)")
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::query("failed to create hosts index", e))?;

    sqlx::query("INSERT OR IGNORE INTO workspaces (id, name) VALUES (?, ?)")
        .bind(DEFAULT_WORKSPACE_ID)
        .bind(DEFAULT_WORKSPACE_NAME)
        .execute(&mut *conn)
        .await
        .map_err(|e| StorageError::query("failed to insert default workspace", e))?;

    Ok(())
}
