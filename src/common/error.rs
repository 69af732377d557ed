//! Common Error Types
//!
//! Root error for startup and service wiring. Request-level errors live in
//! `api::error` where they map onto HTTP statuses.

use thiserror::Error;

/// Root error type for the backend
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Storage errors
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;

    #[test]
    fn test_error_conversion() {
        let err: AppError = StorageError::NotFound("x".to_string()).into();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(err.to_string().contains("storage error"));
    }
}
