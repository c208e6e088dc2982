//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid credentials (wrong password or unknown staff email).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Missing, malformed or expired token.
    #[error("invalid token")]
    InvalidToken,

    /// Token signing failed.
    #[error("token signing error")]
    TokenSigning,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
