use regex::Regex;
use std::sync::LazyLock;

use crate::error::AppError;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("static regex")
});

pub const PASSWORD_MIN_LENGTH: usize = 8;
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Returns the trimmed value of a mandatory text field, or a 400 naming the field.
pub fn required_text(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// Trims an optional text field, treating blank strings as absent.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    if email.len() > 254 {
        return Err(AppError::Validation(
            "Email is too long (max 254 characters)".to_string(),
        ));
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err(AppError::Validation("Invalid email format".to_string()));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at least {PASSWORD_MIN_LENGTH} characters"
        )));
    }
    if len > PASSWORD_MAX_LENGTH {
        return Err(AppError::Validation(format!(
            "Password must be at most {PASSWORD_MAX_LENGTH} characters"
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: i32) -> Result<(), AppError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(AppError::Validation(
            "Rating must be between 1 and 5".to_string(),
        ))
    }
}

pub fn validate_seats(seats: i32) -> Result<(), AppError> {
    if seats < 0 {
        return Err(AppError::Validation("Seats cannot be negative".to_string()));
    }
    Ok(())
}
