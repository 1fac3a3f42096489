pub mod patient;
pub mod payload;
pub mod test_result;
pub mod user;

use crate::error::CoreError;

/// Human-readable sequential identifiers are zero padded to six digits.
pub fn sequential_id(n: u64) -> String {
    format!("{n:06}")
}

/// Reject blank values for a required form field.
pub(crate) fn require(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::MissingField(field.to_string()));
    }
    Ok(())
}
