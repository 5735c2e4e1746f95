//! Refund requests raised by customers.

use sqlx::PgPool;
use thiserror::Error;

use dukaan_core::{
    OrderDetail, Refund, RefundDetail, RefundItem, RefundLineRequest, RefundPlanError,
    lock_claimed_quantities, plan_refund,
};

use super::RepositoryError;

/// Why a refund request was not recorded.
#[derive(Debug, Error)]
pub enum CreateRefundError {
    #[error(transparent)]
    Plan(#[from] RefundPlanError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for CreateRefundError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for `shop.refund` writes from the storefront.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Plan and record a refund request with status `requested`.
    ///
    /// The order row stays locked from reading the claimed quantities until
    /// the insert commits, so concurrent requests cannot both claim the same
    /// units.
    ///
    /// # Errors
    ///
    /// Returns `CreateRefundError::Plan` if the request does not fit the
    /// order, `CreateRefundError::Repository` if a statement fails.
    pub async fn create(
        &self,
        order: &OrderDetail,
        reason: &str,
        requested: &[RefundLineRequest],
    ) -> Result<RefundDetail, CreateRefundError> {
        let mut tx = self.pool.begin().await?;

        let claimed = lock_claimed_quantities(&mut tx, order.order.id).await?;
        let plan = plan_refund(
            order,
            |variant| claimed.get(&variant).copied().unwrap_or(0),
            requested,
        )?;

        let refund = sqlx::query_as::<_, Refund>(
            r"
            INSERT INTO shop.refund (order_id, order_number, reason, amount)
            VALUES ($1, $2, $3, $4)
            RETURNING id, order_id, order_number, reason, status, amount, admin_note,
                      restock, restocked, created_at, updated_at
            ",
        )
        .bind(order.order.id)
        .bind(&order.order.order_number)
        .bind(reason)
        .bind(plan.amount)
        .fetch_one(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(plan.lines.len());
        for line in &plan.lines {
            let item = sqlx::query_as::<_, RefundItem>(
                r"
                INSERT INTO shop.refund_item
                    (refund_id, variant_id, sku, product_name, variant_label, quantity, unit_price)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING refund_id, variant_id, sku, product_name, variant_label,
                          quantity, unit_price
                ",
            )
            .bind(refund.id)
            .bind(line.variant_id)
            .bind(&line.sku)
            .bind(&line.product_name)
            .bind(&line.variant_label)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await?;
            items.push(item);
        }

        tx.commit().await?;
        Ok(RefundDetail { refund, items })
    }
}
