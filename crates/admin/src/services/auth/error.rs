//! Admin authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during admin authentication operations.
#[derive(Debug, Error)]
pub enum AdminAuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] dukaan_core::EmailError),

    /// Wrong email or password. Both read the same.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Password too short or too long.
    #[error("{0}")]
    WeakPassword(String),

    /// Name missing or too long.
    #[error("{0}")]
    InvalidName(String),

    /// Admin user already exists.
    #[error("admin user already exists")]
    UserAlreadyExists,

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
