use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::StorageError;
use crate::store::{BoxFuture, ObjectStore, Precondition, StoredObject};

/// Process-local store for development and tests.
///
/// ETags are opaque quoted counters, fresh on every write.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    next_etag: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, StoredObject>> {
        self.objects.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn put_sync(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        precondition: Precondition<'_>,
    ) -> Result<String, StorageError> {
        let mut objects = self.lock();
        let current = objects.get(key).and_then(|o| o.etag.as_deref());

        let holds = match precondition {
            Precondition::None => true,
            Precondition::IfMatch(expected) => current == Some(expected),
            Precondition::IfAbsent => !objects.contains_key(key),
        };
        if !holds {
            return Err(StorageError::PreconditionFailed {
                key: key.to_string(),
            });
        }

        let etag = format!("\"{}\"", self.next_etag.fetch_add(1, Ordering::Relaxed) + 1);
        objects.insert(
            key.to_string(),
            StoredObject {
                body,
                etag: Some(etag.clone()),
                content_type: content_type.map(str::to_string),
            },
        );
        Ok(etag)
    }
}

impl ObjectStore for MemoryObjectStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<StoredObject, StorageError>> {
        let found = self.lock().get(key).cloned().ok_or(StorageError::NotFound {
            key: key.to_string(),
        });
        Box::pin(async move { found })
    }

    fn put<'a>(
        &'a self,
        key: &'a str,
        body: Vec<u8>,
        content_type: Option<&'a str>,
        precondition: Precondition<'a>,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        let written = self.put_sync(key, body, content_type, precondition);
        Box::pin(async move { written })
    }

    fn delete<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        self.lock().remove(key);
        Box::pin(async { Ok(()) })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BoxFuture<'a, Result<Vec<String>, StorageError>> {
        let keys = self
            .lock()
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        Box::pin(async move { Ok(keys) })
    }

    fn download_url<'a>(
        &'a self,
        key: &'a str,
        _expires_in: Duration,
    ) -> BoxFuture<'a, Result<String, StorageError>> {
        Box::pin(async move { Ok(format!("memory:///{key}")) })
    }
}
