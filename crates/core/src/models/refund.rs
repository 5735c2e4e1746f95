//! Refund (return request) records.

#[cfg(feature = "postgres")]
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::OrderDetail;
use crate::types::{OrderId, RefundId, RefundStatus, VariantId, round_money};

/// A return/refund request against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub order_number: String,
    pub reason: String,
    pub status: RefundStatus,
    pub amount: Decimal,
    pub admin_note: Option<String>,
    /// Whether returned units should go back into stock once approved.
    pub restock: bool,
    /// Set once the units have been added back; restocking never repeats.
    pub restocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    /// Whether saving the refund in its current state must put the returned
    /// units back into stock. Once `restocked` is set this is always false.
    #[must_use]
    pub const fn needs_restock(&self) -> bool {
        self.status.triggers_restock() && self.restock && !self.restocked
    }
}

/// A returned quantity of one variant.
///
/// The sku and names are copied from the order line, so the record stays
/// whole after the variant is deleted and `variant_id` goes null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct RefundItem {
    pub refund_id: RefundId,
    pub variant_id: Option<VariantId>,
    pub sku: String,
    pub product_name: String,
    pub variant_label: String,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// A refund with its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundDetail {
    #[serde(flatten)]
    pub refund: Refund,
    pub items: Vec<RefundItem>,
}

/// A requested return quantity for one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundLineRequest {
    pub variant_id: VariantId,
    pub quantity: i32,
}

/// One line of a validated refund, with the order line snapshot to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRefundLine {
    pub variant_id: VariantId,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub sku: String,
    pub product_name: String,
    pub variant_label: String,
}

/// A validated refund: the lines to record and the amount owed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPlan {
    /// One entry per requested variant, in request order.
    pub lines: Vec<PlannedRefundLine>,
    pub amount: Decimal,
}

/// Why a refund request cannot be accepted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefundPlanError {
    #[error("order {0} is not eligible for a refund in its current status")]
    OrderNotEligible(String),
    #[error("at least one item is required")]
    NoItems,
    #[error("quantity for variant {0} must be at least 1")]
    InvalidQuantity(VariantId),
    #[error("variant {0} is listed more than once")]
    DuplicateVariant(VariantId),
    #[error("variant {0} is not part of this order")]
    NotInOrder(VariantId),
    #[error("only {available} unit(s) of variant {variant_id} can still be refunded")]
    ExceedsRefundable { variant_id: VariantId, available: i32 },
}

/// Validate a refund request against an order.
///
/// `claimed` returns the quantity of a variant already covered by
/// non-rejected refunds of the same order. Each requested quantity must fit
/// in what was ordered minus what is already claimed. The amount is the sum
/// of the unit prices charged at checkout.
///
/// # Errors
///
/// Returns the first [`RefundPlanError`] the request violates.
pub fn plan_refund(
    order: &OrderDetail,
    claimed: impl Fn(VariantId) -> i32,
    requested: &[RefundLineRequest],
) -> Result<RefundPlan, RefundPlanError> {
    if !order.order.status.accepts_refund_requests() {
        return Err(RefundPlanError::OrderNotEligible(
            order.order.order_number.clone(),
        ));
    }
    if requested.is_empty() {
        return Err(RefundPlanError::NoItems);
    }

    let mut lines = Vec::with_capacity(requested.len());
    let mut amount = Decimal::ZERO;
    for (index, line) in requested.iter().enumerate() {
        if line.quantity < 1 {
            return Err(RefundPlanError::InvalidQuantity(line.variant_id));
        }
        if requested
            .iter()
            .take(index)
            .any(|earlier| earlier.variant_id == line.variant_id)
        {
            return Err(RefundPlanError::DuplicateVariant(line.variant_id));
        }
        let item = order
            .item_for(line.variant_id)
            .ok_or(RefundPlanError::NotInOrder(line.variant_id))?;
        let available = (order.ordered_quantity(line.variant_id) - claimed(line.variant_id)).max(0);
        if line.quantity > available {
            return Err(RefundPlanError::ExceedsRefundable {
                variant_id: line.variant_id,
                available,
            });
        }
        amount += item.unit_price * Decimal::from(line.quantity);
        lines.push(PlannedRefundLine {
            variant_id: line.variant_id,
            quantity: line.quantity,
            unit_price: item.unit_price,
            sku: item.sku.clone(),
            product_name: item.product_name.clone(),
            variant_label: item.variant_label.clone(),
        });
    }

    Ok(RefundPlan {
        lines,
        amount: round_money(amount),
    })
}

/// Lock an order row for the rest of the transaction and return the units
/// per variant already covered by its non-rejected refunds.
///
/// Refund creation must plan against these numbers inside the same
/// transaction that inserts the refund; a second request for the same order
/// waits on the lock and then sees the first one's lines.
///
/// # Errors
///
/// Returns `sqlx::Error` if either statement fails.
#[cfg(feature = "postgres")]
pub async fn lock_claimed_quantities(
    conn: &mut sqlx::PgConnection,
    order_id: OrderId,
) -> Result<HashMap<VariantId, i32>, sqlx::Error> {
    sqlx::query("SELECT id FROM shop.orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    let rows: Vec<(VariantId, i64)> = sqlx::query_as(
        r"
        SELECT ri.variant_id, SUM(ri.quantity)::BIGINT
        FROM shop.refund_item ri
        JOIN shop.refund r ON r.id = ri.refund_id
        WHERE r.order_id = $1 AND r.status <> 'rejected' AND ri.variant_id IS NOT NULL
        GROUP BY ri.variant_id
        ",
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(variant, qty)| (variant, i32::try_from(qty).unwrap_or(i32::MAX)))
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::{Order, OrderItem};
    use crate::types::{CurrencyCode, Email, OrderItemId, OrderStatus, PaymentMethod};

    fn order(status: OrderStatus) -> OrderDetail {
        let now = Utc::now();
        let item = |id: i32, variant: i32, qty: i32, price: i64| OrderItem {
            id: OrderItemId::new(id),
            order_id: OrderId::new(1),
            product_id: None,
            variant_id: Some(VariantId::new(variant)),
            product_name: "Lawn Kurta".into(),
            variant_label: "M".into(),
            sku: format!("LK-{variant}"),
            unit_price: Decimal::new(price, 0),
            quantity: qty,
            line_total: Decimal::new(price * i64::from(qty), 0),
        };
        OrderDetail {
            order: Order {
                id: OrderId::new(1),
                order_number: "DK-20260101-ABC123".into(),
                user_id: None,
                customer_name: "Hina".into(),
                customer_email: Email::parse("hina@example.pk").unwrap(),
                customer_phone: "03001234567".into(),
                address_line1: Some("House 1".into()),
                address_line2: None,
                city: Some("Lahore".into()),
                postal_code: None,
                shipping_method_id: None,
                shipping_method_name: "Standard".into(),
                branch_id: None,
                payment_method: PaymentMethod::CashOnDelivery,
                status,
                subtotal: Decimal::new(7500, 0),
                shipping_fee: Decimal::ZERO,
                total: Decimal::new(7500, 0),
                currency: CurrencyCode::PKR,
                notes: None,
                tracking_number: None,
                courier: None,
                created_at: now,
                updated_at: now,
            },
            items: vec![item(1, 10, 2, 2500), item(2, 11, 1, 2500)],
        }
    }

    fn line(variant: i32, quantity: i32) -> RefundLineRequest {
        RefundLineRequest {
            variant_id: VariantId::new(variant),
            quantity,
        }
    }

    #[test]
    fn test_plan_sums_unit_prices() {
        let plan = plan_refund(&order(OrderStatus::Delivered), |_| 0, &[line(10, 2), line(11, 1)])
            .unwrap();
        assert_eq!(plan.amount, Decimal::new(7500, 0));
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].sku, "LK-10");
        assert_eq!(plan.lines[0].product_name, "Lawn Kurta");
        assert_eq!(plan.lines[1].unit_price, Decimal::new(2500, 0));
    }

    #[test]
    fn test_already_claimed_units_reduce_availability() {
        let claimed = |v: VariantId| if v == VariantId::new(10) { 1 } else { 0 };
        let err = plan_refund(&order(OrderStatus::Shipped), claimed, &[line(10, 2)]).unwrap_err();
        assert_eq!(
            err,
            RefundPlanError::ExceedsRefundable {
                variant_id: VariantId::new(10),
                available: 1
            }
        );
        assert!(plan_refund(&order(OrderStatus::Shipped), claimed, &[line(10, 1)]).is_ok());
    }

    #[test]
    fn test_rejects_ineligible_orders_and_bad_lines() {
        assert!(matches!(
            plan_refund(&order(OrderStatus::Pending), |_| 0, &[line(10, 1)]),
            Err(RefundPlanError::OrderNotEligible(_))
        ));
        let delivered = order(OrderStatus::Delivered);
        assert_eq!(plan_refund(&delivered, |_| 0, &[]), Err(RefundPlanError::NoItems));
        assert_eq!(
            plan_refund(&delivered, |_| 0, &[line(99, 1)]),
            Err(RefundPlanError::NotInOrder(VariantId::new(99)))
        );
        assert_eq!(
            plan_refund(&delivered, |_| 0, &[line(10, 0)]),
            Err(RefundPlanError::InvalidQuantity(VariantId::new(10)))
        );
        assert_eq!(
            plan_refund(&delivered, |_| 0, &[line(10, 1), line(10, 1)]),
            Err(RefundPlanError::DuplicateVariant(VariantId::new(10)))
        );
    }

    #[test]
    fn test_needs_restock_runs_once() {
        let now = Utc::now();
        let mut refund = Refund {
            id: RefundId::new(1),
            order_id: OrderId::new(1),
            order_number: "DK-20260101-ABC123".into(),
            reason: "Wrong size".into(),
            status: RefundStatus::Requested,
            amount: Decimal::new(2500, 0),
            admin_note: None,
            restock: true,
            restocked: false,
            created_at: now,
            updated_at: now,
        };
        assert!(!refund.needs_restock());

        refund.status = RefundStatus::Approved;
        assert!(refund.needs_restock());
        refund.restocked = true;
        assert!(!refund.needs_restock());

        refund.restocked = false;
        refund.restock = false;
        refund.status = RefundStatus::Refunded;
        assert!(!refund.needs_restock());

        refund.restock = true;
        refund.status = RefundStatus::Rejected;
        assert!(!refund.needs_restock());
    }
}
