use shared_models::error::AppError;

/// Trims `raw` and requires a non-empty ASCII alphanumeric identifier.
pub fn validate_identifier(field: &str, raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{} must not be empty", field)));
    }
    if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(AppError::ValidationError(format!(
            "{} may only contain letters and digits",
            field
        )));
    }
    Ok(trimmed.to_string())
}

/// Appointments can only be placed strictly after `now`.
pub fn ensure_future(time: i64, now: i64) -> Result<(), AppError> {
    if time <= now {
        return Err(AppError::ValidationError(
            "Appointments cannot be scheduled in the past or at the current instant".to_string(),
        ));
    }
    Ok(())
}
