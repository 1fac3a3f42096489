//! Named monotonic counters behind the sequential display ids.

use memora_core::keys;
use memora_core::models::sequential_id;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::records::{self, Versioned};
use crate::store::ObjectStore;

pub const MAX_ATTEMPTS: usize = 5;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Counter {
    current: u64,
}

/// Increment the counter and return the new value. The first call yields 1.
///
/// Each attempt is a conditional write, so two concurrent callers never get
/// the same value; the loser re-reads and tries again.
pub async fn next_value(store: &dyn ObjectStore, name: &str) -> Result<u64, StorageError> {
    let key = keys::counter(name);

    for attempt in 1..=MAX_ATTEMPTS {
        let (next, written) = match records::load_optional::<Counter>(store, &key).await? {
            Some(Versioned { record, etag }) => {
                let next = record.current.saturating_add(1);
                let written =
                    records::replace(store, &key, &Counter { current: next }, etag.as_deref())
                        .await;
                (next, written)
            }
            None => (1, records::create(store, &key, &Counter { current: 1 }).await),
        };

        match written {
            Ok(_) => return Ok(next),
            Err(StorageError::PreconditionFailed { .. }) => {
                tracing::debug!(counter = name, attempt, "counter write lost a race, retrying");
            }
            Err(e) => return Err(e),
        }
    }

    Err(StorageError::Contention {
        key,
        attempts: MAX_ATTEMPTS,
    })
}

/// The next sequential display id for `name`, zero padded to six digits.
pub async fn next_sequential_id(
    store: &dyn ObjectStore,
    name: &str,
) -> Result<String, StorageError> {
    next_value(store, name).await.map(sequential_id)
}
