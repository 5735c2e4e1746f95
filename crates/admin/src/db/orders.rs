//! Order management: listing, detail and fulfilment updates.

use sqlx::{PgPool, Postgres, QueryBuilder};

use dukaan_core::{Order, OrderDetail, OrderId, OrderItem, OrderStatus, PageRequest};

use super::{RepositoryError, like_pattern};
use crate::input::OrderChanges;

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, customer_name, customer_email, customer_phone,
    address_line1, address_line2, city, postal_code, shipping_method_id,
    shipping_method_name, branch_id, payment_method, status, subtotal,
    shipping_fee, total, currency, notes, tracking_number, courier,
    created_at, updated_at";

/// Filters for the order listing.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches order number, customer email or customer name.
    pub q: Option<String>,
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &OrderFilter) {
    query.push(" WHERE TRUE");
    if let Some(status) = filter.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        query
            .push(" AND (order_number ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Repository for `shop.orders` on the admin side.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Orders, newest first, with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: PageRequest,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.orders");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query =
            QueryBuilder::<Postgres>::new(format!("SELECT {ORDER_COLUMNS} FROM shop.orders"));
        push_filters(&mut query, filter);
        query.push(" ORDER BY created_at DESC, id DESC");
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let items = query.build_query_as::<Order>().fetch_all(self.pool).await?;
        Ok((items, total))
    }

    /// An order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };
        let items = self.items(id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, variant_id, product_name, variant_label,
                   sku, unit_price, quantity, line_total
            FROM shop.order_item
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await?)
    }

    /// Change status, tracking number or courier.
    ///
    /// Status moves are not restricted and cancelling does not touch stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown order.
    pub async fn update(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<OrderDetail, RepositoryError> {
        if !changes.is_empty() {
            let mut query = QueryBuilder::<Postgres>::new("UPDATE shop.orders SET ");
            let mut set = query.separated(", ");
            if let Some(status) = changes.status {
                set.push("status = ").push_bind_unseparated(status);
            }
            if let Some(tracking) = &changes.tracking_number {
                set.push("tracking_number = ")
                    .push_bind_unseparated(tracking.clone());
            }
            if let Some(courier) = &changes.courier {
                set.push("courier = ").push_bind_unseparated(courier.clone());
            }
            set.push("updated_at = NOW()");
            query.push(" WHERE id = ").push_bind(id);

            let result = query.build().execute(self.pool).await?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}
