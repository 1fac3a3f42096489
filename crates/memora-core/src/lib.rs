//! memora-core
//!
//! Pure domain types, record key conventions, and list queries.
//! No AWS SDK dependency; this is the shared vocabulary of the Memora console.

pub mod error;
pub mod keys;
pub mod models;
pub mod query;
