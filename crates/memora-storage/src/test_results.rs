//! Test-result records.

use memora_core::keys;
use memora_core::models::test_result::{TestResult, TestResultUpdate};
use uuid::Uuid;

use crate::error::StorageError;
use crate::records::{self, Versioned};
use crate::store::ObjectStore;

pub async fn get(
    store: &dyn ObjectStore,
    id: Uuid,
) -> Result<Versioned<TestResult>, StorageError> {
    records::load(store, &keys::test_result(id)).await
}

pub async fn list(store: &dyn ObjectStore) -> Result<Vec<TestResult>, StorageError> {
    records::list(store, keys::TEST_RESULTS_PREFIX).await
}

/// Store a new result. Fails with `PreconditionFailed` if the id is taken.
pub async fn create(store: &dyn ObjectStore, result: &TestResult) -> Result<String, StorageError> {
    records::create(store, &keys::test_result(result.id), result).await
}

/// Apply a partial update to a stored result.
///
/// When `expected_etag` is given the update only lands on that exact
/// version. Either way the write is conditional on the version that was
/// read, so a concurrent write in between fails with `PreconditionFailed`
/// instead of being overwritten.
pub async fn update(
    store: &dyn ObjectStore,
    id: Uuid,
    update: TestResultUpdate,
    expected_etag: Option<&str>,
    now: jiff::Timestamp,
) -> Result<Versioned<TestResult>, StorageError> {
    let key = keys::test_result(id);
    let Versioned { mut record, etag } = records::load::<TestResult>(store, &key).await?;

    if expected_etag.is_some_and(|expected| etag.as_deref() != Some(expected)) {
        return Err(StorageError::PreconditionFailed { key });
    }

    record.apply_update(update, now);
    let etag = records::replace(store, &key, &record, etag.as_deref()).await?;
    tracing::debug!(test_result = %id, "test result updated");

    Ok(Versioned {
        record,
        etag: Some(etag),
    })
}

pub async fn delete(store: &dyn ObjectStore, id: Uuid) -> Result<(), StorageError> {
    records::delete(store, &keys::test_result(id)).await
}
