//! Object key conventions.
//!
//! Pure string functions with no AWS SDK dependency. These define the canonical
//! layout of records in the Memora bucket.

use uuid::Uuid;

pub const PATIENTS_PREFIX: &str = "patients/";

pub const USERS_PREFIX: &str = "users/";

pub const TEST_RESULTS_PREFIX: &str = "test_results/";

pub fn patient(uid: Uuid) -> String {
    format!("patients/{uid}.json")
}

/// Staff records are keyed by the identity provider subject.
pub fn user(uid: &str) -> String {
    format!("users/{uid}.json")
}

pub fn test_result(id: Uuid) -> String {
    format!("test_results/{id}.json")
}

pub fn counter(name: &str) -> String {
    format!("counters/{name}.json")
}

pub fn audio(file_name: &str) -> String {
    format!("audios/{file_name}")
}

/// Names of the sequential id counters.
pub mod counters {
    pub const PATIENTS: &str = "patients";
    pub const USERS: &str = "users";
}
