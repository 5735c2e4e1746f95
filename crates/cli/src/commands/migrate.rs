//! Database migration command.
//!
//! Applies the SQL migrations under `migrations/` and creates the two
//! session tables: the storefront's default `tower_sessions.session` and
//! the admin panel's `admin.session`.

use sqlx::migrate::MigrateError;
use thiserror::Error;
use tower_sessions_sqlx_store::PostgresStore;

use dukaan_admin::db::create_pool;
use dukaan_admin::middleware::session_store;

use super::{MissingEnvVar, database_url};

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] MigrateError),
}

/// Run every pending migration.
///
/// # Errors
///
/// Returns an error if `DATABASE_URL` is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let url = database_url()?;

    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    tracing::info!("Running migrations...");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    tracing::info!("Creating session tables...");
    PostgresStore::new(pool.clone()).migrate().await?;
    session_store(&pool).migrate().await?;

    tracing::info!("Migrations complete");
    Ok(())
}
