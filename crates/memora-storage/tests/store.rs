use std::sync::Arc;

use memora_core::keys;
use memora_core::models::test_result::{TestResult, TestResultUpdate};
use memora_storage::counters;
use memora_storage::error::StorageError;
use memora_storage::memory::MemoryObjectStore;
use memora_storage::records;
use memora_storage::store::{ObjectStore, Precondition};
use memora_storage::test_results;
use serde_json::json;
use tokio::task::JoinSet;
use uuid::Uuid;

fn result(id: Uuid) -> TestResult {
    serde_json::from_value(json!({
        "uid": id,
        "patientId": "000001",
        "result": [{ "taskKey": "a", "questionKey": "1", "score": 1, "isCorrect": true }],
        "score": 1,
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z",
    }))
    .unwrap()
}

fn now() -> jiff::Timestamp {
    "2026-01-06T10:00:00Z".parse().unwrap()
}

#[tokio::test]
async fn conditional_writes_respect_etags() {
    let store = MemoryObjectStore::new();

    let first = store
        .put("k", b"1".to_vec(), None, Precondition::IfAbsent)
        .await
        .unwrap();
    let again = store
        .put("k", b"2".to_vec(), None, Precondition::IfAbsent)
        .await;
    assert!(matches!(again, Err(StorageError::PreconditionFailed { .. })));

    let second = store
        .put("k", b"2".to_vec(), None, Precondition::IfMatch(&first))
        .await
        .unwrap();
    assert_ne!(first, second);

    let stale = store
        .put("k", b"3".to_vec(), None, Precondition::IfMatch(&first))
        .await;
    assert!(matches!(stale, Err(StorageError::PreconditionFailed { .. })));

    let stored = store.get("k").await.unwrap();
    assert_eq!(stored.body, b"2");
    assert_eq!(stored.etag.as_deref(), Some(second.as_str()));
}

#[tokio::test]
async fn missing_object_is_not_found() {
    let store = MemoryObjectStore::new();
    assert!(matches!(
        store.get("nope").await,
        Err(StorageError::NotFound { .. })
    ));
    assert!(
        records::load_optional::<serde_json::Value>(&store, "nope")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn listing_skips_unreadable_records() {
    let store = MemoryObjectStore::new();
    let good = result(Uuid::new_v4());
    test_results::create(&store, &good).await.unwrap();
    store
        .put(
            "test_results/broken.json",
            b"{not json".to_vec(),
            None,
            Precondition::None,
        )
        .await
        .unwrap();
    store
        .put("patients/x.json", b"{}".to_vec(), None, Precondition::None)
        .await
        .unwrap();

    let listed = test_results::list(&store).await.unwrap();
    assert_eq!(listed, vec![good]);
}

#[tokio::test]
async fn counters_start_at_one_and_pad_to_six_digits() {
    let store = MemoryObjectStore::new();
    assert_eq!(
        counters::next_sequential_id(&store, keys::counters::PATIENTS)
            .await
            .unwrap(),
        "000001"
    );
    assert_eq!(
        counters::next_sequential_id(&store, keys::counters::PATIENTS)
            .await
            .unwrap(),
        "000002"
    );
    assert_eq!(
        counters::next_sequential_id(&store, keys::counters::USERS)
            .await
            .unwrap(),
        "000001"
    );
}

#[tokio::test]
async fn concurrent_increments_never_repeat() {
    let store = Arc::new(MemoryObjectStore::new());
    let mut tasks = JoinSet::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        tasks.spawn(async move { counters::next_value(store.as_ref(), "patients").await });
    }

    let mut values = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        values.push(joined.unwrap().unwrap());
    }
    values.sort_unstable();
    assert_eq!(values, (1..=8).collect::<Vec<u64>>());
}

#[tokio::test]
async fn update_applies_and_refreshes_timestamp() {
    let store = MemoryObjectStore::new();
    let id = Uuid::new_v4();
    test_results::create(&store, &result(id)).await.unwrap();

    let updated = test_results::update(&store, id, TestResultUpdate::Approved, None, now())
        .await
        .unwrap();
    assert!(updated.record.approved);
    assert_eq!(updated.record.updated_at, now());

    let reloaded = test_results::get(&store, id).await.unwrap();
    assert!(reloaded.record.approved);
    assert_eq!(reloaded.etag, updated.etag);
}

#[tokio::test]
async fn mistyped_items_survive_a_rewrite() {
    let store = MemoryObjectStore::new();
    let id = Uuid::new_v4();
    let document = json!({
        "uid": id,
        "patientId": "000001",
        "result": [
            { "taskKey": "a", "questionKey": "1", "score": 1, "isCorrect": true },
            { "taskKey": "b", "questionKey": "1", "score": 0, "isCorrect": "false" },
            { "taskKey": "c", "questionKey": 2, "score": 1, "time": 75 }
        ],
        "score": 2,
        "created_at": "2026-01-05T09:00:00Z",
        "updated_at": "2026-01-05T09:00:00Z",
    });
    store
        .put(
            &keys::test_result(id),
            serde_json::to_vec(&document).unwrap(),
            Some("application/json"),
            Precondition::None,
        )
        .await
        .unwrap();

    let approved = test_results::update(&store, id, TestResultUpdate::Approved, None, now())
        .await
        .unwrap();
    assert_eq!(approved.record.items.len(), 3);

    let stored = store.get(&keys::test_result(id)).await.unwrap();
    let written: serde_json::Value = serde_json::from_slice(&stored.body).unwrap();
    let items = written["result"].as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1]["isCorrect"], json!(false));
    assert_eq!(items[2]["questionKey"], json!("2"));
    assert_eq!(items[2]["time"], json!("75"));
    assert_eq!(written["score"].as_f64(), Some(2.0));
}

#[tokio::test]
async fn update_against_a_stale_version_conflicts() {
    let store = MemoryObjectStore::new();
    let id = Uuid::new_v4();
    test_results::create(&store, &result(id)).await.unwrap();
    let read = test_results::get(&store, id).await.unwrap();

    test_results::update(&store, id, TestResultUpdate::Approved, None, now())
        .await
        .unwrap();

    let stale = test_results::update(
        &store,
        id,
        TestResultUpdate::Scores {
            items: vec![],
            total_score: 0.0,
        },
        read.etag.as_deref(),
        now(),
    )
    .await;
    assert!(matches!(stale, Err(StorageError::PreconditionFailed { .. })));

    let current = test_results::get(&store, id).await.unwrap().record;
    assert_eq!(current.total_score, 1.0);
}

#[tokio::test]
async fn updating_a_missing_result_is_not_found() {
    let store = MemoryObjectStore::new();
    let missing = test_results::update(
        &store,
        Uuid::new_v4(),
        TestResultUpdate::Approved,
        None,
        now(),
    )
    .await;
    assert!(matches!(missing, Err(StorageError::NotFound { .. })));
}
