pub mod auth;
pub mod health;
pub mod patients;
pub mod public;
pub mod test_results;
pub mod users;

use serde::Serialize;

/// `{ "success": true }`, plus the flattened record when there is one.
#[derive(Debug, Serialize)]
pub struct Saved<T> {
    pub success: bool,
    #[serde(flatten)]
    pub record: T,
}

impl<T> Saved<T> {
    pub fn new(record: T) -> Self {
        Self {
            success: true,
            record,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn ok() -> Self {
        Self { success: true }
    }
}
