//! Admin user management.
//!
//! # Usage
//!
//! ```bash
//! DUKAAN_ADMIN_PASSWORD='correct horse battery' \
//!     dukaan admin create -e admin@example.pk -n "Ayesha Khan" -r super_admin
//! ```
//!
//! The password comes from the environment so it never shows up in shell
//! history or the process list.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use dukaan_admin::db::create_pool;
use dukaan_admin::services::{AdminAuthError, AdminAuthService};
use dukaan_core::AdminRole;

use super::{MissingEnvVar, database_url};

const PASSWORD_VAR: &str = "DUKAAN_ADMIN_PASSWORD";

#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid role: {0}. Must be one of: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] AdminAuthError),
}

/// Parse a role name as typed on the command line.
pub(crate) fn parse_role(role: &str) -> Result<AdminRole, AdminError> {
    role.trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_string()))
}

fn read_password() -> Result<SecretString, MissingEnvVar> {
    std::env::var(PASSWORD_VAR)
        .ok()
        .filter(|p| !p.is_empty())
        .map(SecretString::from)
        .ok_or(MissingEnvVar(PASSWORD_VAR))
}

/// Create an admin user.
///
/// # Errors
///
/// Returns an error if the role or password is invalid, the email is
/// taken, or the database is unreachable.
pub async fn create_user(email: &str, name: &str, role: &str) -> Result<(), AdminError> {
    // Check the cheap things before connecting.
    let role = parse_role(role)?;
    let password = read_password()?;
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    let admin = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password.expose_secret())
        .await?;

    tracing::info!(
        admin_id = %admin.id,
        email = %admin.email,
        role = %admin.role,
        "Created admin user"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("super_admin").ok(), Some(AdminRole::SuperAdmin));
        assert_eq!(parse_role(" Admin ").ok(), Some(AdminRole::Admin));
        assert_eq!(parse_role("viewer").ok(), Some(AdminRole::Viewer));
        assert!(matches!(
            parse_role("owner"),
            Err(AdminError::InvalidRole(r)) if r == "owner"
        ));
    }
}
