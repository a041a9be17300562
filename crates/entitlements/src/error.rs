//! Entitlement and credit-metering error types

use fintrack_shared::FintrackError;
use thiserror::Error;

/// Credit-metering errors
///
/// `QuotaExceeded` is the only failure the command path surfaces to callers;
/// it carries the user-facing message computed by the check so the API layer
/// can return it verbatim with a 403.
#[derive(Debug, Error)]
pub enum CreditError {
    #[error("{message}")]
    QuotaExceeded { message: String },

    #[error("Usage store error: {0}")]
    Store(String),
}

impl From<sqlx::Error> for CreditError {
    fn from(err: sqlx::Error) -> Self {
        CreditError::Store(err.to_string())
    }
}

impl From<CreditError> for FintrackError {
    fn from(err: CreditError) -> Self {
        match err {
            CreditError::QuotaExceeded { message } => FintrackError::Forbidden(message),
            CreditError::Store(msg) => FintrackError::Database(msg),
        }
    }
}

pub type CreditResult<T> = Result<T, CreditError>;
