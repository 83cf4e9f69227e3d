//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

use super::error::FieldErrors;

/// Phone numbers: optional leading `+`, then digits, spaces, dashes or parentheses
static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+?[0-9(][0-9 ()\-]{2,19}$").expect("phone regex is valid")
});

/// Validate a phone number
pub fn validate_phone_number(phone: &str) -> bool {
    phone.len() <= 20 && PHONE_REGEX.is_match(phone)
}

/// Reject values that are empty once surrounding whitespace is dropped
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Message for a missing required field, in the style the mobile client shows
pub fn required_message(field: &str) -> String {
    format!("The {} field is required.", field.replace('_', " "))
}

/// Message for a value outside its allowed set
pub fn invalid_selection_message(field: &str) -> String {
    format!("The selected {} is invalid.", field.replace('_', " "))
}

/// Append a message to a field in an error map
pub fn push_error(errors: &mut FieldErrors, field: impl Into<String>, message: impl Into<String>) {
    errors.entry(field.into()).or_default().push(message.into());
}
