//! Common validation rules shared across request payloads.

use validator::ValidationError;

use crate::services::punctuality::parse_time_of_day;

/// Validates username format.
///
/// Requirements:
/// - Only alphanumeric characters and underscores
/// - 3-100 characters in length
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.len() < 3 || username.len() > 100 {
        return Err(ValidationError::new("username_invalid_length"));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ValidationError::new("username_invalid_characters"));
    }

    Ok(())
}

/// Validates a shift boundary written as `HH:MM:SS` or `HH:MM`.
pub fn validate_time_of_day(value: &str) -> Result<(), ValidationError> {
    parse_time_of_day(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("time_of_day_invalid"))
}

/// Validates an employee code such as `EMP001`.
pub fn validate_employee_code(code: &str) -> Result<(), ValidationError> {
    if code.is_empty() || code.len() > 50 {
        return Err(ValidationError::new("employee_code_invalid_length"));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::new("employee_code_invalid_characters"));
    }
    Ok(())
}
