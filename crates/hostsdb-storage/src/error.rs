//! Storage error types

use std::error::Error as StdError;
use thiserror::Error;

/// Boxed error for wrapping backend-specific errors
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Point lookup matched no row
    #[error("not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Connection or pool failure
    #[error("connection failed: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// Statement execution failure (constraint violation, bad SQL, lost connection)
    #[error("query failed: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// A non-NULL column could not be decoded into the requested type
    #[error("type mismatch in column {column}: {message}")]
    TypeMismatch { column: String, message: String },

    /// Invalid connection string
    #[error("invalid connection string: {0}")]
    InvalidConnectionString(String),
}

impl StorageError {
    /// Create a connection error with source
    pub fn connection(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a query error with source
    pub fn query(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Query {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify a sqlx failure raised while running `operation`.
    ///
    /// Column decode failures become [`StorageError::TypeMismatch`]; pool
    /// exhaustion and I/O failures become [`StorageError::Connection`];
    /// everything else is a [`StorageError::Query`].
    pub fn from_sqlx(operation: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::ColumnDecode { index, source } => Self::TypeMismatch {
                column: index.trim_matches('"').to_string(),
                message: source.to_string(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::connection(format!("{operation} failed"), err)
            }
            other => Self::query(format!("{operation} failed"), other),
        }
    }

    /// True for errors that mean the requested row does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Message of the innermost error, for surfacing to API callers
    pub fn root_message(&self) -> String {
        let mut current: &dyn StdError = self;
        while let Some(next) = current.source() {
            current = next;
        }
        current.to_string()
    }
}
