//! memora-audit
//!
//! Application-level audit trail for console actions.

pub mod events;

pub use events::{Action, AuditEvent, ResourceType};
