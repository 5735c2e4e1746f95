//! Refund review, admin-initiated refunds and restocking.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use tracing::instrument;

use dukaan_core::{
    OrderDetail, PageRequest, Refund, RefundDetail, RefundId, RefundItem, RefundLineRequest,
    RefundPlanError, RefundStatus, lock_claimed_quantities, plan_refund,
};

use super::RepositoryError;
use crate::input::RefundChanges;

/// Why a staff refund was not recorded.
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

const REFUND_COLUMNS: &str = "id, order_id, order_number, reason, status, amount, admin_note, \
     restock, restocked, created_at, updated_at";

async fn items_of(
    conn: &mut PgConnection,
    refund_id: RefundId,
) -> Result<Vec<RefundItem>, RepositoryError> {
    Ok(sqlx::query_as::<_, RefundItem>(
        r"
        SELECT refund_id, variant_id, sku, product_name, variant_label, quantity, unit_price
        FROM shop.refund_item
        WHERE refund_id = $1
        ORDER BY id
        ",
    )
    .bind(refund_id)
    .fetch_all(conn)
    .await?)
}

/// Repository for `shop.refund` on the admin side.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Refunds, newest first, with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        status: Option<RefundStatus>,
        page: PageRequest,
    ) -> Result<(Vec<Refund>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.refund");
        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {REFUND_COLUMNS} FROM shop.refund"));
        if let Some(status) = status {
            count.push(" WHERE status = ").push_bind(status);
            query.push(" WHERE status = ").push_bind(status);
        }
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        query.push(" ORDER BY created_at DESC, id DESC");
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());
        let items = query.build_query_as::<Refund>().fetch_all(self.pool).await?;

        Ok((items, total))
    }

    /// A refund with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: RefundId) -> Result<Option<RefundDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let refund = sqlx::query_as::<_, Refund>(&format!(
            "SELECT {REFUND_COLUMNS} FROM shop.refund WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(refund) = refund else {
            return Ok(None);
        };
        let items = items_of(&mut conn, id).await?;
        Ok(Some(RefundDetail { refund, items }))
    }

    /// Plan and record a refund raised by staff. It starts as `requested`
    /// like a customer request and goes through the same review.
    ///
    /// Planning happens under the order's row lock, the same one a customer
    /// request takes.
    ///
    /// # Errors
    ///
    /// Returns `CreateRefundError::Plan` if the lines do not fit the order,
    /// `CreateRefundError::Repository` if a statement fails.
    pub async fn create(
        &self,
        order: &OrderDetail,
        reason: &str,
        requested: &[RefundLineRequest],
        admin_note: Option<&str>,
        restock: bool,
    ) -> Result<RefundDetail, CreateRefundError> {
        let mut tx = self.pool.begin().await?;

        let claimed = lock_claimed_quantities(&mut tx, order.order.id).await?;
        let plan = plan_refund(
            order,
            |variant| claimed.get(&variant).copied().unwrap_or(0),
            requested,
        )?;

        let refund = sqlx::query_as::<_, Refund>(&format!(
            r"
            INSERT INTO shop.refund (order_id, order_number, reason, amount, admin_note, restock)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {REFUND_COLUMNS}
            "
        ))
        .bind(order.order.id)
        .bind(&order.order.order_number)
        .bind(reason)
        .bind(plan.amount)
        .bind(admin_note)
        .bind(restock)
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

    /// Apply a review decision, restocking returned units when the refund
    /// becomes approved or refunded.
    ///
    /// The refund row is locked for the whole transaction, so two concurrent
    /// approvals restock once.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown refund.
    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: RefundId,
        changes: &RefundChanges,
    ) -> Result<RefundDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Refund>(&format!(
            "SELECT {REFUND_COLUMNS} FROM shop.refund WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        let mut next = current;
        if let Some(status) = changes.status {
            next.status = status;
        }
        if let Some(note) = &changes.admin_note {
            next.admin_note.clone_from(note);
        }
        if let Some(restock) = changes.restock {
            next.restock = restock;
        }

        let items = items_of(&mut tx, id).await?;
        if next.needs_restock() {
            // Lines whose variant was deleted have nowhere to go back to.
            for item in &items {
                let Some(variant_id) = item.variant_id else {
                    continue;
                };
                sqlx::query("UPDATE shop.variant SET stock = stock + $2 WHERE id = $1")
                    .bind(variant_id)
                    .bind(item.quantity)
                    .execute(&mut *tx)
                    .await?;
            }
            next.restocked = true;
            tracing::info!(refund_id = %id, items = items.len(), "Refund restocked");
        }

        let refund = sqlx::query_as::<_, Refund>(&format!(
            r"
            UPDATE shop.refund
            SET status = $2, admin_note = $3, restock = $4, restocked = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {REFUND_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next.status)
        .bind(&next.admin_note)
        .bind(next.restock)
        .bind(next.restocked)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(RefundDetail { refund, items })
    }
}
