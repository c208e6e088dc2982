//! Unified error handling for route handlers.
//!
//! All route handlers return `Result<T, AppError>`. Validation failures
//! serialize every violated field; infrastructure failures log the detail
//! server-side and answer with a generic message so internals never leak
//! to clients.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use krambam_core::order::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// The submitted payload violated one or more field rules.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Missing or invalid staff credential.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_)) {
            tracing::error!(error = %self, "request error");
        }

        match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "errors": errors.fields() })),
            )
                .into_response(),
            Self::Database(err) => database_response(&err),
            Self::Auth(err) => auth_response(&err),
            Self::Unauthorized(_) => {
                (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
            }
            Self::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("Not found: {what}")).into_response()
            }
        }
    }
}

fn database_response(err: &RepositoryError) -> Response {
    match err {
        // Integrity failures are the client's fault (an order referencing
        // catalog data that does not exist) and deserve a clear message.
        RepositoryError::Conflict(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "errors": [{ "field": "orders", "message": message }] })),
        )
            .into_response(),
        RepositoryError::NotFound => {
            (StatusCode::NOT_FOUND, "Not found").into_response()
        }
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal_response(),
    }
}

fn auth_response(err: &AuthError) -> Response {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
        }
        AuthError::TokenSigning | AuthError::PasswordHash | AuthError::Repository(_) => {
            internal_response()
        }
    }
}

fn internal_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Something went wrong, please try again later",
    )
        .into_response()
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            status(AppError::Validation(ValidationErrors::default())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AppError::Unauthorized("no cookie".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status(AppError::NotFound("order".into())),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn integrity_errors_are_client_errors() {
        assert_eq!(
            status(AppError::Database(RepositoryError::Conflict(
                "unknown product id".into()
            ))),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn infrastructure_errors_stay_opaque() {
        assert_eq!(
            status(AppError::Database(RepositoryError::Database(
                sqlx::Error::PoolTimedOut
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
