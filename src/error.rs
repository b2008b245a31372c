//! Structured error types for gateway responses.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,
    InvalidFieldValue,

    // Not found errors
    TaskNotFound,
    ListNotFound,

    // Store errors
    StoreUnavailable,
}

/// Structured error for gateway responses.
///
/// Validation and not-found errors are reported to the caller and never
/// retried; `StoreUnavailable` is what read paths absorb into an empty
/// result and write paths surface.
#[derive(Debug, Serialize, Error)]
#[error("{message}")]
pub struct StoreError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl StoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn invalid_value(field: &str, reason: &str) -> Self {
        Self::new(ErrorCode::InvalidFieldValue, reason).with_field(field)
    }

    pub fn task_not_found(task_id: &str) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn list_not_found(list_id: &str) -> Self {
        Self::new(
            ErrorCode::ListNotFound,
            format!("List not found: {}", list_id),
        )
    }

    pub fn store_unavailable(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StoreUnavailable, err.to_string())
    }

    /// True for caller-input failures that should never be retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::MissingRequiredField | ErrorCode::InvalidFieldValue
        )
    }

    /// True when the target row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.code, ErrorCode::TaskNotFound | ErrorCode::ListNotFound)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::store_unavailable(err)
    }
}

// Allow using ? across the anyhow-based store internals: a StoreError that
// went through anyhow comes back out intact, anything else is a store failure.
impl From<anyhow::Error> for StoreError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<StoreError>() {
            Ok(store_err) => store_err,
            Err(err) => StoreError::store_unavailable(err),
        }
    }
}

/// Result type for gateway operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
