//! Test utilities for hostsdb unit tests.
//!
//! Provides request builders, body readers and an in-memory store so handler
//! tests stay short.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

/// Builds a request, with a JSON content type when a body is given.
pub fn request(method: Method, uri: &str, body: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("failed to build request"),
        None => builder.body(Body::empty()).expect("failed to build request"),
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not JSON")
}

/// Creates an in-memory SQLite store with the bootstrap schema applied.
#[cfg(feature = "sqlite")]
pub async fn create_test_store() -> std::sync::Arc<dyn hostsdb_storage::HostStore> {
    let config = hostsdb_storage::StorageConfig::sqlite_memory();
    hostsdb_storage::create_store(&config, &hostsdb_storage::PoolSettings::default())
        .await
        .expect("failed to create in-memory store")
}
