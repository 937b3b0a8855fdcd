//! Storage layer for hostsdb
//!
//! Provides a backend-agnostic repository over the `hosts` table together with
//! the connection pool that serves it.
//!
//! # Supported Backends
//!
//! - **PostgreSQL** (feature: `postgres`, default) - production datastore
//! - **SQLite** (feature: `sqlite`, default) - embedded, for local runs and tests
//!
//! # Architecture
//!
//! All backends implement the same traits:
//! - [`HostRepository`] - CRUD over hosts
//! - [`HostStore`] - repository plus pool lifecycle (probe, telemetry, close)
//!
//! Column values travel as [`Nullable<T>`] so SQL `NULL` survives to JSON.
//!
//! # Examples
//!
//! ```no_run
//! use hostsdb_storage::{create_store, PoolSettings, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::from_url("postgres://msf@127.0.0.1:5433/msf")?;
//! let store = create_store(&config, &PoolSettings::default()).await?;
//! let hosts = store.list().await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod nullable;
mod pool;
mod traits;
mod types;

pub mod backends;

// Re-exports
pub use config::{BackendType, ConfigError, StorageConfig};
pub use error::StorageError;
pub use nullable::{decode_column, Nullable};
pub use pool::{
    ConnectionPool, PoolSettings, PoolStats, DEFAULT_ACQUIRE_TIMEOUT, DEFAULT_MAX_CONNECTIONS,
};
pub use traits::{HostRepository, HostStore};
pub use types::{DeleteOutcome, Host, HostId, NewHost, DEFAULT_WORKSPACE_ID, DEFAULT_WORKSPACE_NAME};

/// Create a host store from configuration
///
/// This is the primary entry point. It opens the pool for the configured
/// backend and probes the datastore once, so an unreachable datastore is
/// reported here rather than on the first request. SQLite databases also get
/// the bootstrap schema; PostgreSQL is used as found.
///
/// # Errors
///
/// Returns `StorageError::InvalidConnectionString` if the backend type
/// is not compiled in (missing feature flag).
/// Returns `StorageError::Connection` if the datastore cannot be reached.
pub async fn create_store(
    config: &StorageConfig,
    settings: &PoolSettings,
) -> Result<std::sync::Arc<dyn HostStore>, StorageError> {
    let store: std::sync::Arc<dyn HostStore> = match config.backend {
        #[cfg(feature = "sqlite")]
        BackendType::Sqlite => {
            let store =
                backends::sqlite::SqliteHostStore::new(&config.connection_string, settings.clone())
                    .await?;
            store.initialize_schema().await?;
            std::sync::Arc::new(store)
        }
        #[cfg(not(feature = "sqlite"))]
        BackendType::Sqlite => {
            return Err(StorageError::InvalidConnectionString(
                "SQLite backend not compiled in (enable 'sqlite' feature)".into(),
            ))
        }
        #[cfg(feature = "postgres")]
        BackendType::Postgres => std::sync::Arc::new(
            backends::postgres::PostgresHostStore::new(&config.connection_string, settings.clone())
                .await?,
        ),
        #[cfg(not(feature = "postgres"))]
        BackendType::Postgres => {
            return Err(StorageError::InvalidConnectionString(
                "PostgreSQL backend not compiled in (enable 'postgres' feature)".into(),
            ))
        }
    };

    store.ping().await?;
    Ok(store)
}
