//! Banners, branches and shipping methods as the storefront sees them.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use dukaan_core::{Banner, Branch, BranchId, ShippingMethod, ShippingMethodId};

use super::RepositoryError;

/// Repository for storefront content reads.
pub struct ContentRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContentRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active banners whose display window contains `now`, by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn live_banners(&self, now: DateTime<Utc>) -> Result<Vec<Banner>, RepositoryError> {
        let banners = sqlx::query_as::<_, Banner>(
            r"
            SELECT id, title, subtitle, image_url, link_url, position, is_active,
                   starts_at, ends_at, created_at, updated_at
            FROM shop.banner
            WHERE is_active
              AND (starts_at IS NULL OR starts_at <= $1)
              AND (ends_at IS NULL OR ends_at > $1)
            ORDER BY position, id
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(banners)
    }

    /// Active branches, optionally in one city (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_branches(&self, city: Option<&str>) -> Result<Vec<Branch>, RepositoryError> {
        let branches = sqlx::query_as::<_, Branch>(
            r"
            SELECT id, name, city, address, phone, opening_hours, pickup_enabled,
                   is_active, created_at, updated_at
            FROM shop.branch
            WHERE is_active AND ($1::TEXT IS NULL OR LOWER(city) = LOWER($1))
            ORDER BY city, name
            ",
        )
        .bind(city)
        .fetch_all(self.pool)
        .await?;

        Ok(branches)
    }

    /// Get a branch by id regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn branch(&self, id: BranchId) -> Result<Option<Branch>, RepositoryError> {
        let branch = sqlx::query_as::<_, Branch>(
            r"
            SELECT id, name, city, address, phone, opening_hours, pickup_enabled,
                   is_active, created_at, updated_at
            FROM shop.branch
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(branch)
    }

    /// Active shipping methods by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active_shipping_methods(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        let methods = sqlx::query_as::<_, ShippingMethod>(
            r"
            SELECT id, name, description, kind, fee, free_shipping_threshold,
                   estimated_days_min, estimated_days_max, is_active, position,
                   created_at, updated_at
            FROM shop.shipping_method
            WHERE is_active
            ORDER BY position, id
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(methods)
    }

    /// Get a shipping method by id regardless of status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn shipping_method(
        &self,
        id: ShippingMethodId,
    ) -> Result<Option<ShippingMethod>, RepositoryError> {
        let method = sqlx::query_as::<_, ShippingMethod>(
            r"
            SELECT id, name, description, kind, fee, free_shipping_threshold,
                   estimated_days_min, estimated_days_max, is_active, position,
                   created_at, updated_at
            FROM shop.shipping_method
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(method)
    }
}
