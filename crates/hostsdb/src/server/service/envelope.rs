//! JSON response envelope and API error classification
//!
//! Every API response is either `{"data": ...}` or
//! `{"error": {"code": <int>, "message": <string>}}`. How an error maps to a
//! transport status depends on [`ErrorStatusMode`].

use std::fmt::Display;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hostsdb_storage::StorageError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// How error kinds map onto HTTP status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusMode {
    /// HTTP 200 with envelope code 500 for every error (wire compatible)
    #[default]
    Envelope,
    /// HTTP status and envelope code follow the error kind
    Mapped,
}

/// Request-scoped failure, rendered into the error envelope
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    /// Point lookup matched no row
    #[error("{0}")]
    NotFound(String),

    /// Any datastore-layer failure
    #[error("{0}")]
    Store(String),

    /// Request body or path parameter could not be decoded
    #[error("{0}")]
    Decode(String),

    /// A column held a value of an unexpected type
    #[error("{0}")]
    TypeMismatch(String),
}

impl ApiError {
    pub fn not_found(id: impl Display) -> Self {
        Self::NotFound(format!("Couldn't find host with 'id'={}", id))
    }

    pub fn decode(err: impl Display) -> Self {
        Self::Decode(format!("Invalid request body: {}", err))
    }

    /// Classify a storage failure, prefixing the message with `context`
    pub fn from_storage(context: &str, err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id, .. } => Self::not_found(id),
            StorageError::TypeMismatch { .. } => {
                Self::TypeMismatch(format!("{}: {}", context, err))
            }
            other => Self::Store(format!("{}: {}", context, other.root_message())),
        }
    }

    /// Status the error maps to when statuses follow error kinds
    pub fn mapped_status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::Store(_) | Self::TypeMismatch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Transport status and envelope code under `mode`
    pub fn status(&self, mode: ErrorStatusMode) -> (StatusCode, u16) {
        match mode {
            ErrorStatusMode::Envelope => (StatusCode::OK, 500),
            ErrorStatusMode::Mapped => {
                let status = self.mapped_status();
                (status, status.as_u16())
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: u16,
    message: &'a str,
}

/// Render a handler outcome as an enveloped JSON response
pub fn render<T: Serialize>(mode: ErrorStatusMode, result: Result<T, ApiError>) -> Response {
    match result {
        Ok(data) => Json(DataEnvelope { data }).into_response(),
        Err(err) => {
            let (status, code) = err.status(mode);
            let message = err.to_string();
            warn!(code, message = %message, "Request failed");
            let body = ErrorEnvelope {
                error: ErrorBody {
                    code,
                    message: &message,
                },
            };
            (status, Json(body)).into_response()
        }
    }
}
