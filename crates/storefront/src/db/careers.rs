//! Job applications submitted through the careers page.

use sqlx::PgPool;

use dukaan_core::{Email, JobApplication};

use super::RepositoryError;

/// A validated application ready to insert.
#[derive(Debug, Clone)]
pub struct NewJobApplication {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub position: String,
    pub cover_letter: Option<String>,
    pub resume_url: Option<String>,
}

/// Repository for `shop.job_application` inserts.
pub struct JobApplicationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> JobApplicationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an application with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, app: &NewJobApplication) -> Result<JobApplication, RepositoryError> {
        let row = sqlx::query_as::<_, JobApplication>(
            r"
            INSERT INTO shop.job_application
                (full_name, email, phone, position, cover_letter, resume_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, full_name, email, phone, position, cover_letter, resume_url,
                      status, created_at, updated_at
            ",
        )
        .bind(&app.full_name)
        .bind(&app.email)
        .bind(&app.phone)
        .bind(&app.position)
        .bind(&app.cover_letter)
        .bind(&app.resume_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }
}
