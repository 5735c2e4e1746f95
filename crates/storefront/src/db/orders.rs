//! Order persistence: placing orders atomically and reading them back.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use dukaan_core::{
    BranchId, CurrencyCode, Email, Order, OrderDetail, OrderId, OrderItem, PaymentMethod,
    ProductId, ShippingMethodId, UserId, VariantId,
};

use super::RepositoryError;

const ORDER_COLUMNS: &str = r"
    id, order_number, user_id, customer_name, customer_email, customer_phone,
    address_line1, address_line2, city, postal_code, shipping_method_id,
    shipping_method_name, branch_id, payment_method, status, subtotal,
    shipping_fee, total, currency, notes, tracking_number, courier,
    created_at, updated_at";

/// Everything needed to insert an order row.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub shipping_method_id: ShippingMethodId,
    pub shipping_method_name: String,
    pub branch_id: Option<BranchId>,
    pub payment_method: PaymentMethod,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub currency: CurrencyCode,
    pub notes: Option<String>,
}

/// One line to insert, snapshotting the catalog at checkout time.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub variant_id: VariantId,
    pub product_name: String,
    pub variant_label: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// Errors from placing an order.
#[derive(Debug, Error)]
pub enum PlaceOrderError {
    /// The generated order number is already taken.
    #[error("order number already exists")]
    DuplicateNumber,

    /// A guarded stock decrement found fewer units than ordered.
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for PlaceOrderError {
    fn from(err: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(err))
    }
}

/// Repository for storefront order access.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order with its items and decrement stock, all in one
    /// transaction. Any failed stock guard rolls everything back.
    ///
    /// # Errors
    ///
    /// `DuplicateNumber` on an order number collision, `InsufficientStock`
    /// with the first SKU that could not be decremented, or a database error.
    pub async fn place(
        &self,
        order_number: &str,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<OrderDetail, PlaceOrderError> {
        let mut tx = self.pool.begin().await?;

        let inserted = insert_order(&mut tx, order_number, order).await?;

        let mut stored = Vec::with_capacity(items.len());
        for item in items {
            let updated = sqlx::query(
                r"
                UPDATE shop.variant
                SET stock = stock - $1
                WHERE id = $2 AND stock >= $1
                ",
            )
            .bind(item.quantity)
            .bind(item.variant_id)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                // Dropping `tx` rolls back.
                return Err(PlaceOrderError::InsufficientStock(item.sku.clone()));
            }

            let row = sqlx::query_as::<_, OrderItem>(
                r"
                INSERT INTO shop.order_item
                    (order_id, product_id, variant_id, product_name, variant_label,
                     sku, unit_price, quantity, line_total)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, order_id, product_id, variant_id, product_name,
                          variant_label, sku, unit_price, quantity, line_total
                ",
            )
            .bind(inserted.id)
            .bind(item.product_id)
            .bind(item.variant_id)
            .bind(&item.product_name)
            .bind(&item.variant_label)
            .bind(&item.sku)
            .bind(item.unit_price)
            .bind(item.quantity)
            .bind(item.line_total)
            .fetch_one(&mut *tx)
            .await?;
            stored.push(row);
        }

        tx.commit().await?;

        Ok(OrderDetail {
            order: inserted,
            items: stored,
        })
    }

    /// Orders placed by a customer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Find an order with items by its customer-facing number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn find_by_number(
        &self,
        order_number: &str,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM shop.orders WHERE order_number = $1"
        ))
        .bind(order_number.trim().to_uppercase())
        .fetch_optional(self.pool)
        .await?;

        let Some(order) = order else {
            return Ok(None);
        };
        let items = self.items(order.id).await?;
        Ok(Some(OrderDetail { order, items }))
    }

    /// Items of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let items = sqlx::query_as::<_, OrderItem>(
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
        .await?;

        Ok(items)
    }
}

async fn insert_order(
    tx: &mut Transaction<'_, Postgres>,
    order_number: &str,
    order: &NewOrder,
) -> Result<Order, PlaceOrderError> {
    sqlx::query_as::<_, Order>(&format!(
        r"
        INSERT INTO shop.orders
            (order_number, user_id, customer_name, customer_email, customer_phone,
             address_line1, address_line2, city, postal_code, shipping_method_id,
             shipping_method_name, branch_id, payment_method, subtotal, shipping_fee,
             total, currency, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING {ORDER_COLUMNS}
        "
    ))
    .bind(order_number)
    .bind(order.user_id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.address_line1)
    .bind(&order.address_line2)
    .bind(&order.city)
    .bind(&order.postal_code)
    .bind(order.shipping_method_id)
    .bind(&order.shipping_method_name)
    .bind(order.branch_id)
    .bind(order.payment_method)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.total)
    .bind(order.currency.code())
    .bind(&order.notes)
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return PlaceOrderError::DuplicateNumber;
        }
        PlaceOrderError::from(e)
    })
}
