//! Lightweight input validation helpers. Keep logic minimal and deterministic.

use crate::{NewTestimonial, ValidationError};

/// Validate a submission before anything is written. Rating needs no check
/// here: `Rating` cannot hold an out-of-range value.
pub fn validate_candidate(candidate: &NewTestimonial) -> Result<(), ValidationError> {
    require_non_empty("name", &candidate.name)?;
    require_non_empty("content", &candidate.content)?;
    Ok(())
}

/// Reject empty or whitespace-only values.
pub fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "is required"));
    }
    Ok(())
}

/// Reject values shorter than `min` characters.
pub fn require_min_chars(
    field: &'static str,
    value: &str,
    min: usize,
) -> Result<(), ValidationError> {
    if value.chars().count() < min {
        return Err(ValidationError::new(
            field,
            format!("must be at least {min} characters"),
        ));
    }
    Ok(())
}
