//! HostRepository trait test suite
//!
//! Tests share one store, so every assertion is scoped to the rows the test
//! itself created.

use hostsdb_storage::{
    HostId, HostRepository, NewHost, Nullable, StorageError, DEFAULT_WORKSPACE_ID,
};

/// Run all HostRepository tests
pub async fn run_all<S: HostRepository>(store: &S) {
    test_create_then_get(store).await;
    test_create_with_null_fields(store).await;
    test_get_not_found(store).await;
    test_list_contains_created_hosts(store).await;
    test_update_comments(store).await;
    test_update_comments_to_null(store).await;
    test_update_unknown_id_affects_no_rows(store).await;
    test_delete_one(store).await;
    test_delete_one_unknown_id(store).await;
    test_delete_many(store).await;
    test_delete_many_echoes_unknown_ids(store).await;
    test_delete_many_empty(store).await;
    test_ids_are_not_reused(store).await;
    test_unicode_and_empty_strings(store).await;
}

/// Helper to insert a host in the default workspace
async fn create_host<S: HostRepository>(store: &S, address: &str, name: &str) -> HostId {
    store
        .create(NewHost {
            workspace_id: DEFAULT_WORKSPACE_ID,
            address: Some(address.to_string()),
            name: Some(name.to_string()),
            state: Some("alive".to_string()),
        })
        .await
        .expect("create host should succeed")
}

/// Test that a created host reads back with its input fields
pub async fn test_create_then_get<S: HostRepository>(store: &S) {
    let id = store
        .create(NewHost {
            workspace_id: DEFAULT_WORKSPACE_ID,
            address: Some("10.0.0.5".into()),
            name: Some("web1".into()),
            state: Some("up".into()),
        })
        .await
        .expect("create should succeed");

    let host = store.get(id).await.expect("get should succeed");
    assert_eq!(host.id, Nullable::new(id));
    assert_eq!(host.workspace_id, Nullable::new(DEFAULT_WORKSPACE_ID));
    assert_eq!(host.address.as_deref(), Some("10.0.0.5"));
    assert_eq!(host.name.as_deref(), Some("web1"));
    assert_eq!(host.state.as_deref(), Some("up"));
    assert!(host.comments.is_null(), "new host has no comments");
}

/// Test that NULL inputs stay NULL
pub async fn test_create_with_null_fields<S: HostRepository>(store: &S) {
    let id = store
        .create(NewHost {
            workspace_id: DEFAULT_WORKSPACE_ID,
            address: Some("10.0.1.1".into()),
            name: None,
            state: None,
        })
        .await
        .expect("create should succeed");

    let host = store.get(id).await.expect("get should succeed");
    assert!(host.name.is_null(), "NULL name should stay NULL");
    assert!(host.state.is_null(), "NULL state should stay NULL");
}

/// Test that an id never created is NotFound
pub async fn test_get_not_found<S: HostRepository>(store: &S) {
    let result = store.get(999_999_999).await;
    match result {
        Err(StorageError::NotFound { entity_type, id }) => {
            assert_eq!(entity_type, "host");
            assert_eq!(id, "999999999");
        }
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

/// Test that list returns every created host and no deleted one
pub async fn test_list_contains_created_hosts<S: HostRepository>(store: &S) {
    let id1 = create_host(store, "10.0.2.1", "list-1").await;
    let id2 = create_host(store, "10.0.2.2", "list-2").await;
    let gone = create_host(store, "10.0.2.3", "list-gone").await;
    store.delete_one(gone).await.expect("delete should succeed");

    let hosts = store.list().await.expect("list should succeed");
    let ids: Vec<i64> = hosts.iter().filter_map(|h| h.id.get().copied()).collect();

    assert!(ids.contains(&id1), "should contain first host");
    assert!(ids.contains(&id2), "should contain second host");
    assert!(!ids.contains(&gone), "should not contain deleted host");

    let listed = hosts
        .iter()
        .find(|h| h.id == Nullable::new(id2))
        .expect("second host listed");
    assert_eq!(listed.name.as_deref(), Some("list-2"));
}

/// Test that only comments change
pub async fn test_update_comments<S: HostRepository>(store: &S) {
    let id = create_host(store, "10.0.3.1", "update-1").await;
    let before = store.get(id).await.expect("get should succeed");

    let rows = store
        .update_comments(id, Some("x".into()))
        .await
        .expect("update should succeed");
    assert_eq!(rows, 1);

    let after = store.get(id).await.expect("get should succeed");
    assert_eq!(after.comments.as_deref(), Some("x"));
    assert_eq!(after.address, before.address);
    assert_eq!(after.name, before.name);
    assert_eq!(after.state, before.state);
    assert_eq!(after.workspace_id, before.workspace_id);
}

/// Test that comments can be cleared
pub async fn test_update_comments_to_null<S: HostRepository>(store: &S) {
    let id = create_host(store, "10.0.3.2", "update-2").await;
    store
        .update_comments(id, Some("temporary".into()))
        .await
        .expect("update should succeed");
    store
        .update_comments(id, None)
        .await
        .expect("update should succeed");

    let host = store.get(id).await.expect("get should succeed");
    assert!(host.comments.is_null());
}

/// Test that updating a missing id is not an error
pub async fn test_update_unknown_id_affects_no_rows<S: HostRepository>(store: &S) {
    let rows = store
        .update_comments(999_999_998, Some("nobody".into()))
        .await
        .expect("update of unknown id is not an error");
    assert_eq!(rows, 0);
}

/// Test single delete
pub async fn test_delete_one<S: HostRepository>(store: &S) {
    let id = create_host(store, "10.0.4.1", "delete-1").await;

    let rows = store.delete_one(id).await.expect("delete should succeed");
    assert_eq!(rows, 1);

    let result = store.get(id).await;
    assert!(
        matches!(result, Err(StorageError::NotFound { .. })),
        "deleted host should be gone"
    );
}

/// Test that deleting a missing id affects no rows
pub async fn test_delete_one_unknown_id<S: HostRepository>(store: &S) {
    let rows = store
        .delete_one(999_999_997)
        .await
        .expect("delete of unknown id is not an error");
    assert_eq!(rows, 0);
}

/// Test batch delete
pub async fn test_delete_many<S: HostRepository>(store: &S) {
    let id1 = create_host(store, "10.0.5.1", "batch-1").await;
    let id2 = create_host(store, "10.0.5.2", "batch-2").await;
    let keep = create_host(store, "10.0.5.3", "batch-keep").await;

    let outcomes = store.delete_many(&[id1, id2]).await;
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].id, id1);
    assert_eq!(outcomes[1].id, id2);
    assert!(outcomes.iter().all(|o| o.rows_affected == 1 && o.error.is_none()));

    assert!(store.get(id1).await.unwrap_err().is_not_found());
    assert!(store.get(id2).await.unwrap_err().is_not_found());
    store.get(keep).await.expect("untouched host should remain");
}

/// Test that every requested id is echoed, known or not
pub async fn test_delete_many_echoes_unknown_ids<S: HostRepository>(store: &S) {
    let id = create_host(store, "10.0.5.4", "batch-mixed").await;

    let outcomes = store.delete_many(&[999_999_996, id]).await;
    let echoed: Vec<i64> = outcomes.iter().map(|o| o.id).collect();
    assert_eq!(echoed, vec![999_999_996, id]);
    assert_eq!(outcomes[0].rows_affected, 0);
    assert_eq!(outcomes[1].rows_affected, 1);
}

/// Test that an empty batch is a no-op
pub async fn test_delete_many_empty<S: HostRepository>(store: &S) {
    let outcomes = store.delete_many(&[]).await;
    assert!(outcomes.is_empty());
}

/// Test that a deleted id is not handed out again
pub async fn test_ids_are_not_reused<S: HostRepository>(store: &S) {
    let first = create_host(store, "10.0.6.1", "reuse-1").await;
    store.delete_one(first).await.expect("delete should succeed");

    let second = create_host(store, "10.0.6.2", "reuse-2").await;
    assert_ne!(first, second);
    assert!(second > first, "ids should keep increasing");
}

/// Test that strings survive unchanged
pub async fn test_unicode_and_empty_strings<S: HostRepository>(store: &S) {
    let id = store
        .create(NewHost {
            workspace_id: DEFAULT_WORKSPACE_ID,
            address: Some("10.0.7.1".into()),
            name: Some("ホスト-ü".into()),
            state: Some(String::new()),
        })
        .await
        .expect("create should succeed");

    let host = store.get(id).await.expect("get should succeed");
    assert_eq!(host.name.as_deref(), Some("ホスト-ü"));
    assert_eq!(
        host.state.as_deref(),
        Some(""),
        "empty string must not become NULL"
    );
}
