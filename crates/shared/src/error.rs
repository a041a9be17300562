//! Error types for Fintrack

use thiserror::Error;

/// Platform-level error, mapped to HTTP statuses at the API boundary
#[derive(Debug, Error)]
pub enum FintrackError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
