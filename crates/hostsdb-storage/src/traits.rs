//! Storage trait definitions
//!
//! - [`HostRepository`]: the CRUD surface over the `hosts` table
//! - [`HostStore`]: repository plus pool lifecycle (probe, telemetry, close)

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::pool::PoolStats;
use crate::types::{DeleteOutcome, Host, HostId, NewHost};

/// CRUD over the `hosts` table
///
/// Every method issues exactly one parameterized statement (the batch delete
/// issues one per id) and is never retried.
#[async_trait]
pub trait HostRepository: Send + Sync {
    /// List all hosts in storage order
    ///
    /// An empty table is `Ok(vec![])`.
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    /// * `StorageError::TypeMismatch` - A column held an unexpected type
    async fn list(&self) -> Result<Vec<Host>, StorageError>;

    /// Get one host by primary key
    ///
    /// # Errors
    /// * `StorageError::NotFound` - No row with this id
    /// * `StorageError::Query` - Database error
    async fn get(&self, id: HostId) -> Result<Host, StorageError>;

    /// Insert a host and return the id the datastore assigned
    ///
    /// # Errors
    /// * `StorageError::Query` - Any failure, including an insert that returned no row
    async fn create(&self, host: NewHost) -> Result<HostId, StorageError>;

    /// Set the `comments` column of one host
    ///
    /// Returns the number of rows affected. Zero rows is not an error; the
    /// caller decides whether an unknown id matters.
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn update_comments(
        &self,
        id: HostId,
        comments: Option<String>,
    ) -> Result<u64, StorageError>;

    /// Delete one host, returning the number of rows affected
    ///
    /// # Errors
    /// * `StorageError::Query` - Database error
    async fn delete_one(&self, id: HostId) -> Result<u64, StorageError>;

    /// Delete each id with its own statement, best effort
    ///
    /// A failure on one id is logged and recorded in its outcome; the
    /// remaining ids are still attempted. The result holds one outcome per
    /// requested id, in request order. There is no enclosing transaction, so
    /// a partially applied batch is expected when some deletes fail.
    async fn delete_many(&self, ids: &[HostId]) -> Vec<DeleteOutcome> {
        let mut outcomes = Vec::with_capacity(ids.len());
        for &id in ids {
            match self.delete_one(id).await {
                Ok(rows_affected) => {
                    debug!(id, rows_affected, "Deleted host");
                    outcomes.push(DeleteOutcome::deleted(id, rows_affected));
                }
                Err(e) => {
                    warn!(id, error = %e, "Failed to delete host, continuing with batch");
                    outcomes.push(DeleteOutcome::failed(id, e.root_message()));
                }
            }
        }
        outcomes
    }
}

/// Host repository with connection pool lifecycle
///
/// This is the handle the server holds for the lifetime of the process.
#[async_trait]
pub trait HostStore: HostRepository {
    /// Liveness probe against the datastore
    ///
    /// # Errors
    /// * `StorageError::Connection` - Datastore unreachable
    async fn ping(&self) -> Result<(), StorageError>;

    /// Point-in-time pool telemetry
    fn pool_stats(&self) -> PoolStats;

    /// Close all pooled connections
    ///
    /// Called during graceful shutdown. Idempotent.
    async fn close(&self);
}
