//! Dashboard counters.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use dukaan_core::{OrderStatus, ProductId, VariantId};

use super::RepositoryError;

/// Variants at or below this stock level are reported as low.
pub const LOW_STOCK_THRESHOLD: i32 = 5;

/// A variant that is running out.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct LowStockVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_name: String,
    pub sku: String,
    pub label: String,
    pub stock: i32,
}

/// Everything `GET /api/dashboard` shows.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSummary {
    /// Every status is present, zero when no order has it.
    pub orders_by_status: BTreeMap<&'static str, i64>,
    pub pending_refunds: i64,
    pub new_applications: i64,
    pub low_stock: Vec<LowStockVariant>,
    /// Sum of totals over orders that are not cancelled.
    pub revenue: Decimal,
}

/// Read-only aggregate queries.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn summary(&self) -> Result<DashboardSummary, RepositoryError> {
        let counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM shop.orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;
        let mut orders_by_status: BTreeMap<&'static str, i64> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for (status, count) in counts {
            orders_by_status.insert(status.as_str(), count);
        }

        let pending_refunds: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.refund WHERE status = 'requested'")
                .fetch_one(self.pool)
                .await?;

        let new_applications: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM shop.job_application WHERE status = 'new'")
                .fetch_one(self.pool)
                .await?;

        let low_stock = sqlx::query_as::<_, LowStockVariant>(
            r"
            SELECT v.id AS variant_id, v.product_id, p.name AS product_name,
                   v.sku, v.label, v.stock
            FROM shop.variant v
            JOIN shop.product p ON p.id = v.product_id
            WHERE v.stock <= $1
            ORDER BY v.stock, p.name, v.position
            ",
        )
        .bind(LOW_STOCK_THRESHOLD)
        .fetch_all(self.pool)
        .await?;

        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM shop.orders WHERE status <> 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardSummary {
            orders_by_status,
            pending_refunds,
            new_applications,
            low_stock,
            revenue,
        })
    }
}
