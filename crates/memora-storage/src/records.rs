use serde::{Serialize, de::DeserializeOwned};

use crate::error::StorageError;
use crate::store::{ObjectStore, Precondition};

const JSON: &str = "application/json";

/// A record together with the ETag it was read at.
#[derive(Debug, Clone)]
pub struct Versioned<T> {
    pub record: T,
    pub etag: Option<String>,
}

/// Load a JSON record. Returns the deserialized value and its ETag.
pub async fn load<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Versioned<T>, StorageError> {
    let output = store.get(key).await?;
    let record: T = serde_json::from_slice(&output.body)?;
    Ok(Versioned {
        record,
        etag: output.etag,
    })
}

/// Like [`load`], but a missing key is `None`.
pub async fn load_optional<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    key: &str,
) -> Result<Option<Versioned<T>>, StorageError> {
    match load(store, key).await {
        Ok(versioned) => Ok(Some(versioned)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Save a JSON record unconditionally. Returns the new ETag.
pub async fn save<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body, Some(JSON), Precondition::None).await
}

/// Save a JSON record only if nothing is stored under `key` yet.
pub async fn create<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    store.put(key, body, Some(JSON), Precondition::IfAbsent).await
}

/// Save a JSON record with ETag optimistic locking.
///
/// Without a known ETag the write falls back to an unconditional save.
pub async fn replace<T: Serialize>(
    store: &dyn ObjectStore,
    key: &str,
    value: &T,
    expected_etag: Option<&str>,
) -> Result<String, StorageError> {
    let body = serde_json::to_vec_pretty(value)?;
    let precondition = match expected_etag {
        Some(etag) => Precondition::IfMatch(etag),
        None => Precondition::None,
    };
    store.put(key, body, Some(JSON), precondition).await
}

pub async fn delete(store: &dyn ObjectStore, key: &str) -> Result<(), StorageError> {
    store.delete(key).await
}

/// Load every JSON record under `prefix`.
///
/// Documents that no longer parse are logged and skipped, as are keys
/// deleted between the list and the get.
pub async fn list<T: DeserializeOwned>(
    store: &dyn ObjectStore,
    prefix: &str,
) -> Result<Vec<T>, StorageError> {
    let keys = store.list(prefix).await?;
    let mut records = Vec::with_capacity(keys.len());

    for key in keys.iter().filter(|k| k.ends_with(".json")) {
        match load::<T>(store, key).await {
            Ok(versioned) => records.push(versioned.record),
            Err(StorageError::NotFound { .. }) => {}
            Err(StorageError::Serialization(e)) => {
                tracing::warn!(key = %key, error = %e, "skipping unreadable record");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}
