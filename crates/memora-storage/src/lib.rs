//! memora-storage
//!
//! Record persistence. JSON documents in S3 behind the [`store::ObjectStore`]
//! seam, with an in-memory store for local runs and tests.

pub mod client;
pub mod counters;
pub mod error;
pub mod memory;
pub mod objects;
pub mod records;
pub mod store;
pub mod test_results;
