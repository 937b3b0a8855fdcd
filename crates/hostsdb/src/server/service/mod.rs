//! HTTP service layer for the hostsdb server
//!
//! [`router`] is the dispatch table; handlers live in `hosts` and `health`
//! and share an [`AppState`] holding the store and the error status policy.

mod envelope;
mod health;
mod hosts;

pub use envelope::{render, ApiError, ErrorStatusMode};
pub use hosts::{CreateHostRequest, CreatedHost, DeleteHostsRequest, RowsAffected, UpdateHostRequest};

use std::sync::Arc;

use axum::response::Response;
use axum::routing::get;
use axum::Router;
use hostsdb_storage::HostStore;
use serde::Serialize;
use tower_http::trace::TraceLayer;

/// State shared by every handler
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn HostStore>,
    error_status: ErrorStatusMode,
}

impl AppState {
    pub fn new(store: Arc<dyn HostStore>, error_status: ErrorStatusMode) -> Self {
        Self {
            store,
            error_status,
        }
    }

    pub(crate) fn store(&self) -> Arc<dyn HostStore> {
        Arc::clone(&self.store)
    }

    pub(crate) fn render<T: Serialize>(&self, result: Result<T, ApiError>) -> Response {
        render(self.error_status, result)
    }
}

/// Build the dispatch table
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/dbstats", get(health::dbstats))
        .route(
            "/api/v1/hosts",
            get(hosts::list_hosts)
                .post(hosts::create_host)
                .delete(hosts::delete_hosts),
        )
        .route(
            "/api/v1/hosts/:id",
            get(hosts::get_host)
                .put(hosts::update_host)
                .delete(hosts::delete_host),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
