//! Shared test harness for storage backends
//!
//! Generic test functions that every [`HostStore`] implementation must pass,
//! so the backends behave identically for all repository operations.
//!
//! # Usage
//!
//! ```ignore
//! use hostsdb_storage::backends::sqlite::SqliteHostStore;
//!
//! #[tokio::test]
//! async fn sqlite_passes_all_tests() {
//!     let store = SqliteHostStore::new(":memory:", PoolSettings::default()).await.unwrap();
//!     store.initialize_schema().await.unwrap();
//!     common::run_all_tests(&store).await;
//! }
//! ```
//!
//! # Adding Tests for New Backends
//!
//! 1. Create a new test file (e.g., `tests/postgres_backend.rs`)
//! 2. Create your store against a database that has the `hosts` table
//! 3. Call `run_all_tests(&store).await` or individual test runners

pub mod host_repository_tests;
pub mod host_store_tests;

use hostsdb_storage::HostStore;

/// Run all storage trait tests
pub async fn run_all_tests<S: HostStore>(store: &S) {
    println!("Running HostRepository tests...");
    host_repository_tests::run_all(store).await;

    println!("Running HostStore tests...");
    host_store_tests::run_all(store).await;

    println!("All storage tests passed!");
}

/// Run only HostRepository trait tests
pub async fn run_host_repository_tests<S: HostStore>(store: &S) {
    host_repository_tests::run_all(store).await;
}

/// Run only HostStore lifecycle tests
pub async fn run_host_store_tests<S: HostStore>(store: &S) {
    host_store_tests::run_all(store).await;
}
