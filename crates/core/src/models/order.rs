//! Order records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{
    BranchId, CurrencyCode, Email, OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId,
    ShippingMethodId, UserId, VariantId,
};

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    /// Customer-facing number, e.g. `DK-20261018-7QX2MA`.
    pub order_number: String,
    /// Set when a logged-in customer checked out.
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub customer_email: Email,
    pub customer_phone: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub shipping_method_id: Option<ShippingMethodId>,
    /// Snapshot of the method name at checkout time.
    pub shipping_method_name: String,
    pub branch_id: Option<BranchId>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    #[cfg_attr(feature = "postgres", sqlx(try_from = "String"))]
    pub currency: CurrencyCode,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub courier: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line of a placed order, snapshotting name, label and price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_label: String,
    pub sku: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

/// An order with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetail {
    /// Quantity ordered for a variant, summed over lines.
    #[must_use]
    pub fn ordered_quantity(&self, variant_id: VariantId) -> i32 {
        self.items
            .iter()
            .filter(|item| item.variant_id == Some(variant_id))
            .map(|item| item.quantity)
            .sum()
    }

    /// The first line that sold a variant, if it was part of the order.
    #[must_use]
    pub fn item_for(&self, variant_id: VariantId) -> Option<&OrderItem> {
        self.items
            .iter()
            .find(|item| item.variant_id == Some(variant_id))
    }
}
