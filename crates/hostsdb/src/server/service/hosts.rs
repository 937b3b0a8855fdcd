//! Host CRUD handlers
//!
//! Each handler decodes its input, runs one repository operation on a
//! detached task and renders the outcome into the JSON envelope.

use std::future::Future;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use hostsdb_storage::{
    DeleteOutcome, HostId, HostRepository, NewHost, Nullable, StorageError, DEFAULT_WORKSPACE_ID,
    DEFAULT_WORKSPACE_NAME,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::envelope::ApiError;
use super::AppState;

/// Body of `POST /api/v1/hosts`
///
/// The workspace is given either by name (only `"default"` resolves) or by id.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateHostRequest {
    #[serde(default)]
    pub workspace: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<i64>,
    pub host: Nullable<String>,
    pub name: Nullable<String>,
    pub state: Nullable<String>,
}

impl CreateHostRequest {
    fn workspace_id(&self) -> Result<i64, ApiError> {
        match (self.workspace_id, self.workspace.as_deref()) {
            (Some(id), _) => Ok(id),
            (None, Some(DEFAULT_WORKSPACE_NAME)) => Ok(DEFAULT_WORKSPACE_ID),
            (None, Some(other)) => Err(ApiError::decode(format!(
                "unknown workspace {:?}, pass workspace_id instead",
                other
            ))),
            (None, None) => Err(ApiError::decode("missing field `workspace` or `workspace_id`")),
        }
    }
}

/// Body of `PUT /api/v1/hosts/{id}`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateHostRequest {
    pub comments: Nullable<String>,
}

/// Body of `DELETE /api/v1/hosts`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteHostsRequest {
    pub ids: Vec<HostId>,
}

/// Echo of a created host
#[derive(Debug, Serialize)]
pub struct CreatedHost {
    pub id: HostId,
    pub host: Nullable<String>,
    pub name: Nullable<String>,
    pub state: Nullable<String>,
}

/// Rows touched by a single-id mutation
#[derive(Debug, Serialize)]
pub struct RowsAffected {
    pub id: HostId,
    pub rows_affected: u64,
}

/// Path id as routed: `None` means the segment is not all digits and the
/// route does not match. Digit strings beyond `i64` are a decode failure.
fn parse_path_id(raw: &str) -> Option<Result<HostId, ApiError>> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(
        raw.parse::<HostId>()
            .map_err(|e| ApiError::Decode(format!("Invalid host id {:?}: {}", raw, e))),
    )
}

fn decode_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(ApiError::decode)
}

/// Run a repository call on its own task
///
/// A client that disconnects drops the handler future; the statement still
/// runs to completion.
async fn detached<T, F>(operation: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, StorageError>> + Send + 'static,
{
    tokio::spawn(operation)
        .await
        .map_err(|e| StorageError::query("repository task failed", e))?
}

/// `GET /api/v1/hosts`
pub async fn list_hosts(State(state): State<AppState>) -> Response {
    debug!("Listing hosts");
    let store = state.store();
    let result = detached(async move { store.list().await })
        .await
        .map_err(|e| ApiError::from_storage("There was an error listing hosts", e));

    if let Ok(hosts) = &result {
        debug!(count = hosts.len(), "Listed hosts");
    }
    state.render(result)
}

/// `GET /api/v1/hosts/{id}`
pub async fn get_host(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let id = match parse_path_id(&raw) {
        None => return StatusCode::NOT_FOUND.into_response(),
        Some(Err(e)) => return state.render::<()>(Err(e)),
        Some(Ok(id)) => id,
    };

    let store = state.store();
    let result = match detached(async move { store.get(id).await }).await {
        Ok(host) => {
            debug!(id, "Host found");
            Ok(host)
        }
        Err(e) if e.is_not_found() => {
            info!(id, "No host with this id");
            Err(ApiError::not_found(&raw))
        }
        Err(e) => Err(ApiError::from_storage("There was an error getting host", e)),
    };
    state.render(result)
}

/// `POST /api/v1/hosts`
pub async fn create_host(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match decode_body::<CreateHostRequest>(&body) {
        Ok(request) => request,
        Err(e) => return state.render::<()>(Err(e)),
    };
    let workspace_id = match request.workspace_id() {
        Ok(id) => id,
        Err(e) => return state.render::<()>(Err(e)),
    };

    let new_host = NewHost {
        workspace_id,
        address: request.host.get().cloned(),
        name: request.name.get().cloned(),
        state: request.state.get().cloned(),
    };

    let store = state.store();
    let result = detached(async move { store.create(new_host).await })
        .await
        .map(|id| {
            info!(id, workspace_id, "Host created");
            CreatedHost {
                id,
                host: request.host,
                name: request.name,
                state: request.state,
            }
        })
        .map_err(|e| ApiError::from_storage("Error creating host", e));
    state.render(result)
}

/// `PUT /api/v1/hosts/{id}`
pub async fn update_host(
    State(state): State<AppState>,
    Path(raw): Path<String>,
    body: Bytes,
) -> Response {
    let id = match parse_path_id(&raw) {
        None => return StatusCode::NOT_FOUND.into_response(),
        Some(Err(e)) => return state.render::<()>(Err(e)),
        Some(Ok(id)) => id,
    };
    let request = match decode_body::<UpdateHostRequest>(&body) {
        Ok(request) => request,
        Err(e) => return state.render::<()>(Err(e)),
    };

    let store = state.store();
    let comments = request.comments.into_inner();
    let result = detached(async move { store.update_comments(id, comments).await })
        .await
        .map(|rows_affected| {
            info!(id, rows_affected, "Host comments updated");
            RowsAffected { id, rows_affected }
        })
        .map_err(|e| ApiError::from_storage("Error updating host", e));
    state.render(result)
}

/// `DELETE /api/v1/hosts/{id}`
///
/// Responds with `null` data on success, as existing callers expect.
pub async fn delete_host(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let id = match parse_path_id(&raw) {
        None => return StatusCode::NOT_FOUND.into_response(),
        Some(Err(e)) => return state.render::<()>(Err(e)),
        Some(Ok(id)) => id,
    };

    let store = state.store();
    let result = detached(async move { store.delete_one(id).await })
        .await
        .map(|rows_affected| {
            if rows_affected == 0 {
                warn!(id, "Delete matched no host");
            } else {
                info!(id, rows_affected, "Host deleted");
            }
        })
        .map_err(|e| ApiError::from_storage("Error deleting host", e));
    state.render(result)
}

/// `DELETE /api/v1/hosts`
///
/// Best effort: every requested id is echoed with its own outcome.
pub async fn delete_hosts(State(state): State<AppState>, body: Bytes) -> Response {
    let request = match decode_body::<DeleteHostsRequest>(&body) {
        Ok(request) => request,
        Err(e) => return state.render::<()>(Err(e)),
    };

    debug!(ids = ?request.ids, "Deleting hosts");
    let store = state.store();
    let ids = request.ids;
    let result: Result<Vec<DeleteOutcome>, ApiError> =
        detached(async move { Ok(store.delete_many(&ids).await) })
            .await
            .map_err(|e| ApiError::from_storage("Error deleting host", e));

    if let Ok(outcomes) = &result {
        let failed = outcomes.iter().filter(|o| o.error.is_some()).count();
        info!(requested = outcomes.len(), failed, "Batch delete finished");
    }
    state.render(result)
}
