//! PostgreSQL backend test runner
//!
//! Runs the shared test suite against the PostgreSQL host store using
//! testcontainers for ephemeral database instances.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p hostsdb-storage --features postgres --test postgres_backend
//! ```
//!
//! # Prerequisites
//!
//! - Docker must be running (testcontainers uses Docker to spin up PostgreSQL)
//! - The `postgres` feature must be enabled

#![cfg(feature = "postgres")]

mod common;

use hostsdb_storage::backends::postgres::PostgresHostStore;
use hostsdb_storage::{
    create_store, HostRepository, HostStore, NewHost, PoolSettings, StorageConfig, StorageError,
};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers_modules::postgres::Postgres;

/// The subset of the deployed schema the repository touches, with the
/// deployment's column types (`INTEGER` keys, `INET` address)
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE workspaces (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE
    )
    "#,
    "INSERT INTO workspaces (id, name) VALUES (1, 'default')",
    r#"
    CREATE TABLE hosts (
        id SERIAL PRIMARY KEY,
        workspace_id INTEGER NOT NULL REFERENCES workspaces(id),
        address INET,
        name VARCHAR(255),
        state VARCHAR(255),
        comments TEXT,
        created_at TIMESTAMP DEFAULT now(),
        updated_at TIMESTAMP DEFAULT now()
    )
    "#,
];

/// Start PostgreSQL, create the schema and return its URL
async fn start_database() -> (String, testcontainers::ContainerAsync<Postgres>) {
    let container = Postgres::default()
        .with_tag("17-alpine")
        .start()
        .await
        .expect("failed to start PostgreSQL container");

    let host = container.get_host().await.expect("failed to get host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("failed to get port");

    // Default user/password/db from testcontainers-modules
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let setup = sqlx::PgPool::connect(&url)
        .await
        .expect("failed to connect for schema setup");
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(&setup)
            .await
            .expect("failed to create schema");
    }
    setup.close().await;

    (url, container)
}

/// Create a PostgreSQL store against a fresh container
async fn create_pg_store() -> (PostgresHostStore, testcontainers::ContainerAsync<Postgres>) {
    let (url, container) = start_database().await;
    let store = PostgresHostStore::new(&url, PoolSettings::default())
        .await
        .expect("failed to create PostgreSQL store");

    // Container must stay alive for the duration of the test
    (store, container)
}

// ============================================================================
// Full Test Suite
// ============================================================================

/// Run the complete storage test suite against PostgreSQL
#[tokio::test]
async fn postgres_passes_all_storage_tests() {
    let (store, _container) = create_pg_store().await;
    common::run_all_tests(&store).await;
}

// ============================================================================
// PostgreSQL-Specific Tests
// ============================================================================

/// Test that a single-host INET address comes back without `/32`
#[tokio::test]
async fn postgres_inet_address_reads_as_plain_ip() {
    let (store, _container) = create_pg_store().await;

    let id = store
        .create(NewHost {
            workspace_id: 1,
            address: Some("192.168.1.20".into()),
            name: Some("inet".into()),
            state: Some("alive".into()),
        })
        .await
        .expect("create should succeed");

    let host = store.get(id).await.expect("get should succeed");
    assert_eq!(host.address.as_deref(), Some("192.168.1.20"));
}

/// Test that a network address keeps its netmask
#[tokio::test]
async fn postgres_inet_network_keeps_netmask() {
    let (store, _container) = create_pg_store().await;

    for address in ["10.0.0.0/24", "fd00::/64", "10.9.9.9"] {
        let id = store
            .create(NewHost {
                workspace_id: 1,
                address: Some(address.into()),
                name: None,
                state: None,
            })
            .await
            .expect("create should succeed");

        let host = store.get(id).await.expect("get should succeed");
        assert_eq!(host.address.as_deref(), Some(address));
    }
}

/// Test that a constraint violation on create is a query error
#[tokio::test]
async fn postgres_create_with_unknown_workspace_fails() {
    let (store, _container) = create_pg_store().await;

    let result = store
        .create(NewHost {
            workspace_id: 4242,
            address: Some("10.2.0.1".into()),
            name: None,
            state: None,
        })
        .await;

    match result {
        Err(StorageError::Query { message, .. }) => assert_eq!(message, "create failed"),
        other => panic!("Expected Query error, got {:?}", other),
    }
}

/// Test that an invalid address is rejected by the datastore
#[tokio::test]
async fn postgres_create_with_invalid_inet_fails() {
    let (store, _container) = create_pg_store().await;

    let result = store
        .create(NewHost {
            workspace_id: 1,
            address: Some("not-an-ip".into()),
            name: None,
            state: None,
        })
        .await;

    assert!(matches!(result, Err(StorageError::Query { .. })));
}

/// Test store creation from a URL
#[tokio::test]
async fn postgres_create_store_from_url() {
    let (url, _container) = start_database().await;

    let config = StorageConfig::from_url(&format!("{}?sslmode=disable", url)).unwrap();
    let store = create_store(&config, &PoolSettings::default())
        .await
        .expect("create_store should succeed");

    assert!(store.list().await.expect("list should succeed").is_empty());
    assert_eq!(store.pool_stats().max_open_connections, 20);
}

/// Test that an unreachable server fails at startup
#[tokio::test]
async fn postgres_unreachable_server_is_connection_error() {
    let settings = PoolSettings::default().with_acquire_timeout(std::time::Duration::from_secs(2));
    let result = PostgresHostStore::new("postgres://postgres@127.0.0.1:1/postgres", settings).await;

    assert!(
        matches!(result, Err(StorageError::Connection { .. })),
        "should fail to connect: {:?}",
        result
    );
}

/// Test PostgreSQL close
#[tokio::test]
async fn postgres_close_works() {
    let (store, _container) = create_pg_store().await;

    store.close().await;
    assert!(store.pool().is_closed());
    assert!(store.ping().await.is_err());
}
