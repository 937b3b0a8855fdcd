//! Domain types for storage layer

use serde::Serialize;

use crate::nullable::Nullable;

/// Surrogate primary key assigned by the datastore
pub type HostId = i64;

/// Workspace id the literal workspace name `"default"` resolves to
pub const DEFAULT_WORKSPACE_ID: i64 = 1;

/// Workspace name that resolves to [`DEFAULT_WORKSPACE_ID`]
pub const DEFAULT_WORKSPACE_NAME: &str = "default";

/// A row of the `hosts` table
///
/// Every column is independently nullable; `NULL` is distinct from `""` and `0`.
/// `workspace_id` is carried for callers but is not part of the JSON wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Host {
    pub id: Nullable<i64>,
    #[serde(skip_serializing)]
    pub workspace_id: Nullable<i64>,
    pub address: Nullable<String>,
    pub name: Nullable<String>,
    pub state: Nullable<String>,
    pub comments: Nullable<String>,
}

/// Insert intent for a new host row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHost {
    pub workspace_id: i64,
    pub address: Option<String>,
    pub name: Option<String>,
    pub state: Option<String>,
}

/// Result of one delete statement within a batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub id: HostId,
    pub rows_affected: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn deleted(id: HostId, rows_affected: u64) -> Self {
        Self {
            id,
            rows_affected,
            error: None,
        }
    }

    pub fn failed(id: HostId, error: impl Into<String>) -> Self {
        Self {
            id,
            rows_affected: 0,
            error: Some(error.into()),
        }
    }
}
