//! Job application review.

use sqlx::{PgPool, Postgres, QueryBuilder};

use dukaan_core::{ApplicationStatus, JobApplication, JobApplicationId, PageRequest};

use super::{RepositoryError, like_pattern};

const APPLICATION_COLUMNS: &str = "id, full_name, email, phone, position, cover_letter, \
     resume_url, status, created_at, updated_at";

/// Filters for the application listing.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    /// Matches applicant name, email or position.
    pub q: Option<String>,
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ApplicationFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        query
            .push(" AND (full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR position ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for `shop.job_application` reads and status changes.
pub struct JobApplicationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> JobApplicationRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Applications, newest first, with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ApplicationFilter,
        page: PageRequest,
    ) -> Result<(Vec<JobApplication>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.job_application");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {APPLICATION_COLUMNS} FROM shop.job_application"
        ));
        push_filters(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC");
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let items = query
            .build_query_as::<JobApplication>()
            .fetch_all(self.pool)
            .await?;
        Ok((items, total))
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: JobApplicationId,
    ) -> Result<Option<JobApplication>, RepositoryError> {
        Ok(sqlx::query_as::<_, JobApplication>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM shop.job_application WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// Set the review status. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown application.
    pub async fn update_status(
        &self,
        id: JobApplicationId,
        status: ApplicationStatus,
    ) -> Result<JobApplication, RepositoryError> {
        sqlx::query_as::<_, JobApplication>(&format!(
            r"
            UPDATE shop.job_application SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {APPLICATION_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown application.
    pub async fn delete(&self, id: JobApplicationId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.job_application WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
