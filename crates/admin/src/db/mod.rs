//! Database operations for the admin panel.
//!
//! Repositories write the `shop` schema (catalog, content, orders, refunds,
//! job applications) and read or write `admin.admin_user`.
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p dukaan-cli -- migrate
//! ```

pub mod admin_users;
pub mod careers;
pub mod catalog;
pub mod content;
pub mod dashboard;
pub mod orders;
pub mod refunds;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use careers::JobApplicationRepository;
pub use catalog::ProductRepository;
pub use content::{BannerRepository, BranchRepository, ShippingMethodRepository};
pub use dashboard::DashboardRepository;
pub use orders::OrderRepository;
pub use refunds::RefundRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug or SKU).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The write would break a rule the database cannot express.
    #[error("invalid: {0}")]
    Invalid(String),
}

/// Map a unique violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_on_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
}

/// Escape `%`, `_` and `\\` for use inside an `ILIKE` pattern.
pub(crate) fn like_pattern(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 2);
    out.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("lawn"), "%lawn%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
