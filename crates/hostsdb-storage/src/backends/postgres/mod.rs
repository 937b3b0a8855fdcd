//! PostgreSQL storage backend implementation
//!
//! The production datastore. Expects the `hosts` and `workspaces` tables to
//! exist already; this crate never creates or migrates them.
//!
//! # Column types
//!
//! `hosts.id` and `hosts.workspace_id` are commonly `INTEGER`, which sqlx will
//! not decode into `i64`, so reads widen them with `::BIGINT`. `hosts.address`
//! is `INET` and is read through `abbrev()` and written through `::inet`.
//!
//! # Connection Pooling
//!
//! Uses [`ConnectionPool`] with the settings passed to [`PostgresHostStore::new`]:
//! - max_connections: 20
//! - max idle: 20
//! - acquire_timeout: 30s unless configured
//!
//! # Security
//!
//! All queries use sqlx's prepared statement bindings. User-provided data is
//! never interpolated into query strings.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, Postgres};
use tracing::info;

use crate::error::StorageError;
use crate::pool::{ConnectionPool, PoolSettings, PoolStats};
use crate::traits::{HostRepository, HostStore};
use crate::types::{Host, HostId, NewHost};

mod hosts;

/// PostgreSQL host store
///
/// # Examples
///
/// ```no_run
/// use hostsdb_storage::backends::postgres::PostgresHostStore;
/// use hostsdb_storage::{HostRepository, PoolSettings};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresHostStore::new(
///     "postgres://msf@127.0.0.1:5433/msf?sslmode=disable",
///     PoolSettings::default(),
/// )
/// .await?;
/// let hosts = store.list().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PostgresHostStore {
    pool: ConnectionPool<Postgres>,
}

impl PostgresHostStore {
    /// Open the pool against a PostgreSQL server
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidConnectionString` if the URL is not a
    /// PostgreSQL URL, and `StorageError::Connection` if the server cannot be
    /// reached or rejects the credentials.
    pub async fn new(url: &str, settings: PoolSettings) -> Result<Self, StorageError> {
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(StorageError::InvalidConnectionString(format!(
                "invalid PostgreSQL URL: must start with postgres:// or postgresql://, got: {}",
                if url.chars().count() > 50 {
                    format!("{}...", url.chars().take(50).collect::<String>())
                } else {
                    url.to_string()
                }
            )));
        }

        let options = PgConnectOptions::from_str(url)
            .map_err(|e| StorageError::InvalidConnectionString(e.to_string()))?;
        let pool = ConnectionPool::connect_with(options, settings).await?;
        pool.log_stats("postgres pool initialized");
        info!("Connected to PostgreSQL");

        Ok(Self { pool })
    }

    /// The underlying pool
    pub fn pool(&self) -> &ConnectionPool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl HostRepository for PostgresHostStore {
    async fn list(&self) -> Result<Vec<Host>, StorageError> {
        self.list_impl().await
    }

    async fn get(&self, id: HostId) -> Result<Host, StorageError> {
        self.get_impl(id).await
    }

    async fn create(&self, host: NewHost) -> Result<HostId, StorageError> {
        self.create_impl(host).await
    }

    async fn update_comments(
        &self,
        id: HostId,
        comments: Option<String>,
    ) -> Result<u64, StorageError> {
        self.update_comments_impl(id, comments).await
    }

    async fn delete_one(&self, id: HostId) -> Result<u64, StorageError> {
        self.delete_one_impl(id).await
    }
}

#[async_trait]
impl HostStore for PostgresHostStore {
    async fn ping(&self) -> Result<(), StorageError> {
        self.pool.ping().await
    }

    fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
