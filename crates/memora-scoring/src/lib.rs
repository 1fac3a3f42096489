//! memora-scoring
//!
//! Review workflow for test results. Pure functions, no I/O. Persisting the
//! outcome is the caller's job.
//!
//! A typical edit: [`edit::set_judgment`] on one item, [`edit::apply_item_edit`]
//! to splice it back, then [`total::recompute_total`] before saving.

pub mod approval;
pub mod duration;
pub mod edit;
pub mod total;

pub use approval::approve;
pub use duration::compute_duration;
pub use edit::{apply_item_edit, set_judgment};
pub use total::recompute_total;
