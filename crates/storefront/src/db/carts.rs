//! Persisted carts for logged-in customers.
//!
//! Line order is kept in the `position` column so a customer's cart reads
//! back in the order lines were added.

use sqlx::PgPool;

use dukaan_core::{UserId, VariantId};

use super::RepositoryError;
use crate::services::cart::CartItem;

/// Repository for `shop.cart_line`.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The customer's cart lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let rows: Vec<(VariantId, i32)> = sqlx::query_as(
            r"
            SELECT variant_id, quantity
            FROM shop.cart_line
            WHERE user_id = $1
            ORDER BY position, updated_at
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(variant_id, quantity)| {
                u32::try_from(quantity)
                    .map(|quantity| CartItem {
                        variant_id,
                        quantity,
                    })
                    .map_err(|_| {
                        RepositoryError::DataCorruption(format!(
                            "negative cart quantity for variant {variant_id}"
                        ))
                    })
            })
            .collect()
    }

    /// Replace the whole cart in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn replace(&self, user_id: UserId, items: &[CartItem]) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (position, item) in (0_i32..).zip(items) {
            sqlx::query(
                r"
                INSERT INTO shop.cart_line (user_id, variant_id, quantity, position)
                VALUES ($1, $2, $3, $4)
                ",
            )
            .bind(user_id)
            .bind(item.variant_id)
            .bind(quantity_column(item.quantity))
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Set one line's quantity, appending the line if it is new.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn upsert_line(&self, user_id: UserId, item: CartItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO shop.cart_line (user_id, variant_id, quantity, position)
            VALUES (
                $1, $2, $3,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM shop.cart_line WHERE user_id = $1)
            )
            ON CONFLICT (user_id, variant_id)
            DO UPDATE SET quantity = EXCLUDED.quantity, updated_at = NOW()
            ",
        )
        .bind(user_id)
        .bind(item.variant_id)
        .bind(quantity_column(item.quantity))
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Remove one line. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn remove_line(
        &self,
        user_id: UserId,
        variant_id: VariantId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1 AND variant_id = $2")
            .bind(user_id)
            .bind(variant_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove every line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM shop.cart_line WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

/// Cart quantities are clamped to a small maximum before they get here.
fn quantity_column(quantity: u32) -> i32 {
    i32::try_from(quantity).unwrap_or(i32::MAX)
}
