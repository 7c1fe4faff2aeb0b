// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type.
///
/// The HTTP layer is the only place these kinds turn into status
/// codes; everything below it propagates `AppError` untouched.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

// For infra crates that only have a message to report (orphan rules
// prevent a From<sqlx::Error> impl here).
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Database(err)
    }
}
