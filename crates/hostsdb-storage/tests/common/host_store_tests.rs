//! HostStore lifecycle test suite
//!
//! Must run against an open store; closing is left to the backend runners.

use hostsdb_storage::{HostStore, NewHost, DEFAULT_WORKSPACE_ID};

/// Run all HostStore tests
pub async fn run_all<S: HostStore>(store: &S) {
    test_ping(store).await;
    test_pool_stats_are_consistent(store).await;
    test_pool_stats_survive_traffic(store).await;
}

/// Test that the liveness probe succeeds
pub async fn test_ping<S: HostStore>(store: &S) {
    store.ping().await.expect("ping should succeed");
}

/// Test the relationships between the telemetry fields
pub async fn test_pool_stats_are_consistent<S: HostStore>(store: &S) {
    let stats = store.pool_stats();

    assert!(stats.max_open_connections >= 1);
    assert!(stats.open_connections <= stats.max_open_connections);
    assert!(stats.in_use <= stats.open_connections);
}

/// Test that counters never go backwards
pub async fn test_pool_stats_survive_traffic<S: HostStore>(store: &S) {
    let before = store.pool_stats();

    for i in 0..5 {
        let id = store
            .create(NewHost {
                workspace_id: DEFAULT_WORKSPACE_ID,
                address: Some(format!("10.0.8.{}", i + 1)),
                name: None,
                state: None,
            })
            .await
            .expect("create should succeed");
        store.delete_one(id).await.expect("delete should succeed");
    }

    let after = store.pool_stats();
    assert!(after.wait_count >= before.wait_count);
    assert!(after.wait_duration >= before.wait_duration);
    assert!(after.max_idle_closed >= before.max_idle_closed);
    assert!(after.max_lifetime_closed >= before.max_lifetime_closed);
    assert!(after.open_connections >= 1, "pool should keep a connection");
}
