//! Field checks shared by the create/update payloads.

use thiserror::Error;
use utils::text::{is_valid_email, non_blank};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Returns the trimmed value or an error naming `field`.
pub fn required(field: &str, value: &str) -> Result<String, ValidationError> {
    non_blank(value)
        .map(str::to_string)
        .ok_or_else(|| ValidationError(format!("{field} is required")))
}

pub fn email(field: &str, value: &str) -> Result<(), ValidationError> {
    if is_valid_email(value) {
        Ok(())
    } else {
        Err(ValidationError(format!("{field} must be a valid email address")))
    }
}

pub fn optional_email(field: &str, value: Option<&str>) -> Result<(), ValidationError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => email(field, v),
        None => Ok(()),
    }
}

pub fn non_negative(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => {
            Err(ValidationError(format!("{field} must be a non-negative number")))
        }
        _ => Ok(()),
    }
}

pub fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError(format!("{field} must be greater than zero")))
    }
}

pub fn in_range(field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < min || v > max => Err(ValidationError(format!(
            "{field} must be between {min} and {max}"
        ))),
        _ => Ok(()),
    }
}

pub fn positive_days(field: &str, value: Option<i32>) -> Result<(), ValidationError> {
    match value {
        Some(v) if v <= 0 => Err(ValidationError(format!("{field} must be at least 1 day"))),
        _ => Ok(()),
    }
}
