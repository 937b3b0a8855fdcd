//! HostRepository implementation for SQLite

use sqlx::sqlite::SqliteRow;
use tracing::{debug, warn};

use super::SqliteHostStore;
use crate::error::StorageError;
use crate::nullable::decode_column;
use crate::types::{Host, HostId, NewHost};

impl SqliteHostStore {
    /// List all hosts in storage order
    pub(crate) async fn list_impl(&self) -> Result<Vec<Host>, StorageError> {
        let mut conn = self.pool().acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, workspace_id, address, name, state, comments
            FROM hosts
            "#,
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| StorageError::from_sqlx("list", e))?;

        rows.iter().map(row_to_host).collect()
    }

    /// Get a host by ID
    pub(crate) async fn get_impl(&self, id: HostId) -> Result<Host, StorageError> {
        let mut conn = self.pool().acquire().await?;
        let row = sqlx::query(
            r#"
            SELECT id, workspace_id, address, name, state, comments
            FROM hosts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StorageError::from_sqlx("get", e))?
        .ok_or_else(|| StorageError::NotFound {
            entity_type: "host",
            id: id.to_string(),
        })?;

        row_to_host(&row)
    }

    /// Insert a host, returning the assigned id
    pub(crate) async fn create_impl(&self, host: NewHost) -> Result<HostId, StorageError> {
        let mut conn = self.pool().acquire().await?;
        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO hosts (workspace_id, address, name, state)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(host.workspace_id)
        .bind(host.address)
        .bind(host.name)
        .bind(host.state)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| StorageError::query("create failed", e))?;

        let id = id.ok_or_else(|| StorageError::Query {
            message: "create returned no id".into(),
            source: None,
        })?;
        debug!(id, "Inserted host");
        Ok(id)
    }

    /// Set `comments` on one host
    pub(crate) async fn update_comments_impl(
        &self,
        id: HostId,
        comments: Option<String>,
    ) -> Result<u64, StorageError> {
        let mut conn = self.pool().acquire().await?;
        let result = sqlx::query("UPDATE hosts SET comments = ? WHERE id = ?")
            .bind(comments)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::from_sqlx("update", e))?;

        let rows_affected = result.rows_affected();
        if rows_affected == 0 {
            warn!(id, "Comment update matched no host");
        }
        Ok(rows_affected)
    }

    /// Delete one host
    pub(crate) async fn delete_one_impl(&self, id: HostId) -> Result<u64, StorageError> {
        let mut conn = self.pool().acquire().await?;
        let result = sqlx::query("DELETE FROM hosts WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| StorageError::from_sqlx("delete", e))?;

        Ok(result.rows_affected())
    }
}

/// Convert a database row to a Host
fn row_to_host(row: &SqliteRow) -> Result<Host, StorageError> {
    Ok(Host {
        id: decode_column(row, "id")?,
        workspace_id: decode_column(row, "workspace_id")?,
        address: decode_column(row, "address")?,
        name: decode_column(row, "name")?,
        state: decode_column(row, "state")?,
        comments: decode_column(row, "comments")?,
    })
}
