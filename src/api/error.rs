//! HTTP Error Mapping
//!
//! Request-level error taxonomy: validation → 400, unauthorized → 401,
//! forbidden → 403, not-found → 404, conflict → 409, everything else →
//! 500. Internal detail goes to the logs; response bodies carry it only in
//! debug builds.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Request-level errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::NotFound(_) => "Not found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Internal(_) => "Internal error",
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ApiError::NotFound(what),
            StorageError::Duplicate(what) => ApiError::Conflict(format!("duplicate: {}", what)),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => {
                ApiError::Unauthorized("invalid credentials".to_string())
            }
            AuthError::InvalidToken => {
                ApiError::Unauthorized("invalid or expired token".to_string())
            }
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let details = match &self {
            ApiError::Internal(detail) => {
                tracing::error!(target: "hayat::api", "{}", detail);
                if cfg!(debug_assertions) {
                    detail.clone()
                } else {
                    "internal server error".to_string()
                }
            }
            other => other.to_string(),
        };

        let body = serde_json::json!({
            "error": self.label(),
            "details": details
        });

        (self.status(), Json(body)).into_response()
    }
}

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Unauthorized("x".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("x".to_string()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("x".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("x".to_string()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal("x".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_storage_error_translation() {
        let not_found: ApiError = StorageError::NotFound("id".to_string()).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let duplicate: ApiError = StorageError::Duplicate("email".to_string()).into();
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        let database: ApiError = StorageError::Database("boom".to_string()).into();
        assert_eq!(database.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_error_translation() {
        let bad_token: ApiError = AuthError::InvalidToken.into();
        assert_eq!(bad_token.status(), StatusCode::UNAUTHORIZED);

        let bad_credentials: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(bad_credentials.status(), StatusCode::UNAUTHORIZED);
    }
}
