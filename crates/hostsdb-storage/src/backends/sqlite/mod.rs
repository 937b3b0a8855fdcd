//! SQLite storage backend implementation using sqlx
//!
//! An embedded stand-in for the PostgreSQL datastore, used for local runs and
//! by the test suites. [`SqliteHostStore::initialize_schema`] creates the
//! `workspaces` and `hosts` tables and the `default` workspace when they are
//! missing.
//!
//! # Connection Management
//!
//! Uses [`ConnectionPool`] over sqlx's native async SQLite driver. An
//! in-memory database exists only while a connection to it is open, so for
//! `:memory:` the pool is pinned to a single connection that is never closed.
//!
//! # Security
//!
//! All queries use sqlx's prepared statement bindings (`bind()`) to prevent
//! SQL injection. User-provided data is never interpolated into query strings.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions};
use tracing::info;

use crate::error::StorageError;
use crate::pool::{ConnectionPool, PoolSettings, PoolStats};
use crate::traits::{HostRepository, HostStore};
use crate::types::{Host, HostId, NewHost};

mod hosts;
mod schema;

/// SQLite host store
///
/// # Examples
///
/// ```no_run
/// use hostsdb_storage::backends::sqlite::SqliteHostStore;
/// use hostsdb_storage::PoolSettings;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// // In-memory database for testing
/// let store = SqliteHostStore::new(":memory:", PoolSettings::default()).await?;
/// store.initialize_schema().await?;
///
/// // File-based database for local runs
/// let store = SqliteHostStore::new("/var/lib/hostsdb/hosts.sqlite", PoolSettings::default()).await?;
/// store.initialize_schema().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SqliteHostStore {
    pool: ConnectionPool<Sqlite>,
}

impl SqliteHostStore {
    /// Create a new SQLite host store
    ///
    /// # Arguments
    ///
    /// * `path` - Database path or `:memory:` for in-memory database
    ///   - `:memory:` - In-memory database (for testing)
    ///   - `/path/to/file.sqlite` - File-based database (absolute path)
    ///   - `./relative/path.sqlite` - File-based database (relative path)
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the database connection fails.
    pub async fn new(path: &str, settings: PoolSettings) -> Result<Self, StorageError> {
        let (options, settings) = if path == ":memory:" {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StorageError::connection("invalid SQLite URL", e))?;
            let settings = PoolSettings {
                max_open: 1,
                max_idle: 1,
                min_connections: 1,
                max_lifetime: None,
                ..settings
            };
            (options, settings)
        } else {
            let options = SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", path))
                .map_err(|e| StorageError::connection("invalid SQLite URL", e))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .pragma("wal_autocheckpoint", "1000");
            (options, settings)
        };

        let pool = ConnectionPool::connect_with(options.foreign_keys(true), settings).await?;
        pool.log_stats("sqlite pool initialized");
        info!(path, "Opened SQLite database");

        Ok(Self { pool })
    }

    /// Create the `workspaces` and `hosts` tables and the default workspace
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Query` if a statement fails.
    pub async fn initialize_schema(&self) -> Result<(), StorageError> {
        schema::initialize_schema(self).await
    }

    /// The underlying pool
    pub fn pool(&self) -> &ConnectionPool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl HostRepository for SqliteHostStore {
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
impl HostStore for SqliteHostStore {
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
