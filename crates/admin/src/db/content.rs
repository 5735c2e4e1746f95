//! Banner, branch and shipping method management.
//!
//! Updates replace the whole record; see [`crate::input::content`].

use sqlx::PgPool;

use dukaan_core::{Banner, BannerId, Branch, BranchId, ShippingMethod, ShippingMethodId};

use super::RepositoryError;
use crate::input::{NewBanner, NewBranch, NewShippingMethod};

const BANNER_COLUMNS: &str = "id, title, subtitle, image_url, link_url, position, is_active, \
     starts_at, ends_at, created_at, updated_at";

const BRANCH_COLUMNS: &str = "id, name, city, address, phone, opening_hours, pickup_enabled, \
     is_active, created_at, updated_at";

const SHIPPING_METHOD_COLUMNS: &str = "id, name, description, kind, fee, \
     free_shipping_threshold, estimated_days_min, estimated_days_max, is_active, position, \
     created_at, updated_at";

/// Delete one row by id, `NotFound` when nothing matched.
async fn delete_by_id(pool: &PgPool, table: &str, id: i32) -> Result<(), RepositoryError> {
    let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

/// Repository for `shop.banner`.
pub struct BannerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BannerRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every banner, live or not, by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Banner>, RepositoryError> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.banner ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BannerId) -> Result<Option<Banner>, RepositoryError> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            "SELECT {BANNER_COLUMNS} FROM shop.banner WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewBanner) -> Result<Banner, RepositoryError> {
        Ok(sqlx::query_as::<_, Banner>(&format!(
            r"
            INSERT INTO shop.banner
                (title, subtitle, image_url, link_url, position, is_active, starts_at, ends_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(&new.title)
        .bind(&new.subtitle)
        .bind(&new.image_url)
        .bind(&new.link_url)
        .bind(new.position)
        .bind(new.is_active)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_one(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown banner.
    pub async fn update(&self, id: BannerId, new: &NewBanner) -> Result<Banner, RepositoryError> {
        sqlx::query_as::<_, Banner>(&format!(
            r"
            UPDATE shop.banner
            SET title = $2, subtitle = $3, image_url = $4, link_url = $5, position = $6,
                is_active = $7, starts_at = $8, ends_at = $9, updated_at = NOW()
            WHERE id = $1
            RETURNING {BANNER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&new.title)
        .bind(&new.subtitle)
        .bind(&new.image_url)
        .bind(&new.link_url)
        .bind(new.position)
        .bind(new.is_active)
        .bind(new.starts_at)
        .bind(new.ends_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown banner.
    pub async fn delete(&self, id: BannerId) -> Result<(), RepositoryError> {
        delete_by_id(self.pool, "shop.banner", id.as_i32()).await
    }
}

/// Repository for `shop.branch`.
pub struct BranchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BranchRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Every branch, active or not, by city then name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Branch>, RepositoryError> {
        Ok(sqlx::query_as::<_, Branch>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM shop.branch ORDER BY city, name, id"
        ))
        .fetch_all(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BranchId) -> Result<Option<Branch>, RepositoryError> {
        Ok(sqlx::query_as::<_, Branch>(&format!(
            "SELECT {BRANCH_COLUMNS} FROM shop.branch WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: &NewBranch) -> Result<Branch, RepositoryError> {
        Ok(sqlx::query_as::<_, Branch>(&format!(
            r"
            INSERT INTO shop.branch
                (name, city, address, phone, opening_hours, pickup_enabled, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BRANCH_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.city)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.opening_hours)
        .bind(new.pickup_enabled)
        .bind(new.is_active)
        .fetch_one(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown branch.
    pub async fn update(&self, id: BranchId, new: &NewBranch) -> Result<Branch, RepositoryError> {
        sqlx::query_as::<_, Branch>(&format!(
            r"
            UPDATE shop.branch
            SET name = $2, city = $3, address = $4, phone = $5, opening_hours = $6,
                pickup_enabled = $7, is_active = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {BRANCH_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&new.name)
        .bind(&new.city)
        .bind(&new.address)
        .bind(&new.phone)
        .bind(&new.opening_hours)
        .bind(new.pickup_enabled)
        .bind(new.is_active)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a branch. Orders keep their history; their `branch_id` is
    /// cleared by the foreign key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown branch.
    pub async fn delete(&self, id: BranchId) -> Result<(), RepositoryError> {
        delete_by_id(self.pool, "shop.branch", id.as_i32()).await
    }
}

/// Repository for `shop.shipping_method`.
pub struct ShippingMethodRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ShippingMethodRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<ShippingMethod>, RepositoryError> {
        Ok(sqlx::query_as::<_, ShippingMethod>(&format!(
            "SELECT {SHIPPING_METHOD_COLUMNS} FROM shop.shipping_method ORDER BY position, id"
        ))
        .fetch_all(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        id: ShippingMethodId,
    ) -> Result<Option<ShippingMethod>, RepositoryError> {
        Ok(sqlx::query_as::<_, ShippingMethod>(&format!(
            "SELECT {SHIPPING_METHOD_COLUMNS} FROM shop.shipping_method WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        new: &NewShippingMethod,
    ) -> Result<ShippingMethod, RepositoryError> {
        Ok(sqlx::query_as::<_, ShippingMethod>(&format!(
            r"
            INSERT INTO shop.shipping_method
                (name, description, kind, fee, free_shipping_threshold,
                 estimated_days_min, estimated_days_max, is_active, position)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SHIPPING_METHOD_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.kind)
        .bind(new.fee)
        .bind(new.free_shipping_threshold)
        .bind(new.estimated_days_min)
        .bind(new.estimated_days_max)
        .bind(new.is_active)
        .bind(new.position)
        .fetch_one(self.pool)
        .await?)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown method.
    pub async fn update(
        &self,
        id: ShippingMethodId,
        new: &NewShippingMethod,
    ) -> Result<ShippingMethod, RepositoryError> {
        sqlx::query_as::<_, ShippingMethod>(&format!(
            r"
            UPDATE shop.shipping_method
            SET name = $2, description = $3, kind = $4, fee = $5,
                free_shipping_threshold = $6, estimated_days_min = $7,
                estimated_days_max = $8, is_active = $9, position = $10, updated_at = NOW()
            WHERE id = $1
            RETURNING {SHIPPING_METHOD_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.kind)
        .bind(new.fee)
        .bind(new.free_shipping_threshold)
        .bind(new.estimated_days_min)
        .bind(new.estimated_days_max)
        .bind(new.is_active)
        .bind(new.position)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown method.
    pub async fn delete(&self, id: ShippingMethodId) -> Result<(), RepositoryError> {
        delete_by_id(self.pool, "shop.shipping_method", id.as_i32()).await
    }
}
