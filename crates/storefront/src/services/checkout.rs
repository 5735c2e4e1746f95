//! Checkout: shipping quotes and order placement.
//!
//! Quoting is pure over the hydrated cart, the chosen shipping method and an
//! optional pickup branch. Placing an order re-reads prices from the
//! database, then inserts the order and decrements stock in one transaction.

use chrono::{DateTime, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use dukaan_core::{
    Branch, BranchId, CurrencyCode, Email, OrderDetail, PaymentMethod, ShippingKind,
    ShippingMethod, ShippingMethodId, UserId, round_money,
};

use crate::db::orders::{NewOrder, NewOrderItem, PlaceOrderError};
use crate::db::{ContentRepository, OrderRepository, RepositoryError};
use crate::services::cart::{CartError, CartLine, CartService, CartView};

/// Attempts at generating a unique order number before giving up.
const ORDER_NUMBER_ATTEMPTS: usize = 3;
const ORDER_NUMBER_SUFFIX_LEN: usize = 6;
const ORDER_NUMBER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const MAX_NAME_LEN: usize = 120;
const MAX_PHONE_LEN: usize = 32;
const MAX_ADDRESS_LEN: usize = 255;
const MAX_NOTES_LEN: usize = 1000;

/// Errors from quoting or placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("unknown shipping method")]
    UnknownShippingMethod,

    #[error("branch_id is required for pickup")]
    BranchRequired,

    #[error("branch is not available for pickup")]
    BranchUnavailable,

    #[error("insufficient stock for: {}", .0.join(", "))]
    InsufficientStock(Vec<String>),

    #[error("{0}")]
    Validation(String),

    #[error("could not allocate an order number")]
    OrderNumberExhausted,

    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Shipping choice sent by the client.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct QuoteRequest {
    pub shipping_method_id: ShippingMethodId,
    pub branch_id: Option<BranchId>,
}

/// Priced cart with shipping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub shipping_method: ShippingMethod,
    pub branch: Option<Branch>,
    pub currency: CurrencyCode,
}

/// Fee for a method at a given subtotal.
///
/// Delivery is free once the subtotal reaches the method's threshold.
#[must_use]
pub fn shipping_fee(method: &ShippingMethod, subtotal: Decimal) -> Decimal {
    match (method.kind, method.free_shipping_threshold) {
        (ShippingKind::Delivery, Some(threshold)) if subtotal >= threshold => Decimal::ZERO,
        _ => round_money(method.fee),
    }
}

/// Build a quote from an already-loaded cart, method and branch.
///
/// # Errors
///
/// `EmptyCart`, `InsufficientStock` listing offending SKUs,
/// `UnknownShippingMethod` for a missing or inactive method, and
/// `BranchRequired`/`BranchUnavailable` for pickup problems.
pub fn build_quote(
    cart: CartView,
    method: Option<ShippingMethod>,
    branch_id: Option<BranchId>,
    branch: Option<Branch>,
) -> Result<Quote, CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let short: Vec<String> = cart
        .lines
        .iter()
        .filter(|line| line.exceeds_stock())
        .map(|line| line.sku.clone())
        .collect();
    if !short.is_empty() {
        return Err(CheckoutError::InsufficientStock(short));
    }

    let method = method
        .filter(|m| m.is_active)
        .ok_or(CheckoutError::UnknownShippingMethod)?;

    let branch = match method.kind {
        ShippingKind::Pickup => {
            if branch_id.is_none() {
                return Err(CheckoutError::BranchRequired);
            }
            let branch = branch
                .filter(|b| Some(b.id) == branch_id && b.accepts_pickups())
                .ok_or(CheckoutError::BranchUnavailable)?;
            Some(branch)
        }
        ShippingKind::Delivery => None,
    };

    let fee = shipping_fee(&method, cart.subtotal);
    Ok(Quote {
        subtotal: cart.subtotal,
        shipping_fee: fee,
        total: round_money(cart.subtotal + fee),
        lines: cart.lines,
        shipping_method: method,
        branch,
        currency: cart.currency,
    })
}

/// Generate `DK-YYYYMMDD-XXXXXX` from the UTC date and random characters.
pub fn generate_order_number(now: DateTime<Utc>, rng: &mut impl Rng) -> String {
    let suffix: String = (0..ORDER_NUMBER_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..ORDER_NUMBER_ALPHABET.len());
            char::from(ORDER_NUMBER_ALPHABET.get(idx).copied().unwrap_or(b'X'))
        })
        .collect();
    format!("DK-{}-{suffix}", now.format("%Y%m%d"))
}

/// Checkout form sent by the client.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
    pub payment_method: PaymentMethod,
    pub shipping_method_id: ShippingMethodId,
    pub branch_id: Option<BranchId>,
}

/// Contact and address fields after trimming and validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerDetails {
    pub name: String,
    pub email: Email,
    pub phone: String,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub notes: Option<String>,
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(String::from)
}

fn required(value: &str, field: &str, max: usize) -> Result<String, CheckoutError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(CheckoutError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(CheckoutError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value.to_string())
}

fn optional(value: Option<&str>, field: &str, max: usize) -> Result<Option<String>, CheckoutError> {
    trimmed(value)
        .map(|v| required(&v, field, max))
        .transpose()
}

/// Validate the contact fields. Delivery needs an address line and city.
///
/// # Errors
///
/// `Validation` naming the first bad field.
pub fn validate_customer(
    req: &CheckoutRequest,
    kind: ShippingKind,
) -> Result<CustomerDetails, CheckoutError> {
    let name = required(&req.customer_name, "customer_name", MAX_NAME_LEN)?;
    let email = Email::parse(&req.customer_email)
        .map_err(|e| CheckoutError::Validation(format!("customer_email: {e}")))?;
    let phone = required(&req.customer_phone, "customer_phone", MAX_PHONE_LEN)?;
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')'))
    {
        return Err(CheckoutError::Validation(
            "customer_phone may only contain digits, spaces and + - ( )".to_string(),
        ));
    }

    let address_line1 = optional(req.address_line1.as_deref(), "address_line1", MAX_ADDRESS_LEN)?;
    let city = optional(req.city.as_deref(), "city", MAX_NAME_LEN)?;
    if kind == ShippingKind::Delivery {
        if address_line1.is_none() {
            return Err(CheckoutError::Validation(
                "address_line1 is required for delivery".to_string(),
            ));
        }
        if city.is_none() {
            return Err(CheckoutError::Validation(
                "city is required for delivery".to_string(),
            ));
        }
    }

    Ok(CustomerDetails {
        name,
        email,
        phone,
        address_line1,
        address_line2: optional(req.address_line2.as_deref(), "address_line2", MAX_ADDRESS_LEN)?,
        city,
        postal_code: optional(req.postal_code.as_deref(), "postal_code", 20)?,
        notes: optional(req.notes.as_deref(), "notes", MAX_NOTES_LEN)?,
    })
}

/// Checkout operations over one caller's cart.
pub struct CheckoutService<'a> {
    pool: &'a PgPool,
    cart: CartService<'a>,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, cart: CartService<'a>) -> Self {
        Self { pool, cart }
    }

    /// Quote the current cart.
    ///
    /// # Errors
    ///
    /// See [`build_quote`]; storage failures surface as `Cart`/`Repository`.
    pub async fn quote(&self, req: QuoteRequest) -> Result<Quote, CheckoutError> {
        let cart = self.cart.view().await?;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let content = ContentRepository::new(self.pool);
        let method = content.shipping_method(req.shipping_method_id).await?;
        let branch = match req.branch_id {
            Some(id) => content.branch(id).await?,
            None => None,
        };

        build_quote(cart, method, req.branch_id, branch)
    }

    /// Validate, quote and place the order, then clear the cart.
    ///
    /// # Errors
    ///
    /// Validation and quote errors, `InsufficientStock` when a guarded
    /// decrement fails, `OrderNumberExhausted` after repeated collisions.
    pub async fn place(
        &self,
        req: &CheckoutRequest,
        user_id: Option<UserId>,
    ) -> Result<OrderDetail, CheckoutError> {
        let quote = self
            .quote(QuoteRequest {
                shipping_method_id: req.shipping_method_id,
                branch_id: req.branch_id,
            })
            .await?;
        let customer = validate_customer(req, quote.shipping_method.kind)?;

        let order = NewOrder {
            user_id,
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            address_line1: customer.address_line1,
            address_line2: customer.address_line2,
            city: customer.city,
            postal_code: customer.postal_code,
            shipping_method_id: quote.shipping_method.id,
            shipping_method_name: quote.shipping_method.name.clone(),
            branch_id: quote.branch.as_ref().map(|b| b.id),
            payment_method: req.payment_method,
            subtotal: quote.subtotal,
            shipping_fee: quote.shipping_fee,
            total: quote.total,
            currency: quote.currency,
            notes: customer.notes,
        };
        let items: Vec<NewOrderItem> = quote
            .lines
            .iter()
            .map(|line| NewOrderItem {
                product_id: line.product_id,
                variant_id: line.variant_id,
                product_name: line.product_name.clone(),
                variant_label: line.label.clone(),
                sku: line.sku.clone(),
                unit_price: line.unit_price,
                quantity: i32::try_from(line.quantity).unwrap_or(i32::MAX),
                line_total: line.line_total,
            })
            .collect();

        let repo = OrderRepository::new(self.pool);
        for attempt in 1..=ORDER_NUMBER_ATTEMPTS {
            let number = generate_order_number(Utc::now(), &mut rand::rng());
            match repo.place(&number, &order, &items).await {
                Ok(placed) => {
                    self.cart.clear().await?;
                    tracing::info!(
                        order_number = %placed.order.order_number,
                        total = %placed.order.total,
                        items = placed.items.len(),
                        "Order placed"
                    );
                    return Ok(placed);
                }
                Err(PlaceOrderError::DuplicateNumber) => {
                    tracing::warn!(attempt, order_number = %number, "Order number collision");
                }
                Err(PlaceOrderError::InsufficientStock(sku)) => {
                    return Err(CheckoutError::InsufficientStock(vec![sku]));
                }
                Err(PlaceOrderError::Repository(e)) => return Err(e.into()),
            }
        }

        Err(CheckoutError::OrderNumberExhausted)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use dukaan_core::{ProductId, VariantId};

    use super::*;

    fn method(kind: ShippingKind, fee: i64, threshold: Option<i64>) -> ShippingMethod {
        let now = Utc::now();
        ShippingMethod {
            id: ShippingMethodId::new(1),
            name: "Standard".into(),
            description: None,
            kind,
            fee: Decimal::new(fee, 0),
            free_shipping_threshold: threshold.map(|t| Decimal::new(t, 0)),
            estimated_days_min: Some(2),
            estimated_days_max: Some(4),
            is_active: true,
            position: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn branch(id: i32, pickup: bool) -> Branch {
        let now = Utc::now();
        Branch {
            id: BranchId::new(id),
            name: "Gulberg".into(),
            city: "Lahore".into(),
            address: "Main Blvd".into(),
            phone: None,
            opening_hours: None,
            pickup_enabled: pickup,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn cart(lines: &[(i32, u32, i64, i32)]) -> CartView {
        let lines: Vec<CartLine> = lines
            .iter()
            .map(|&(id, quantity, price, stock)| CartLine {
                variant_id: VariantId::new(id),
                product_id: ProductId::new(1),
                product_slug: "lawn-suit".into(),
                product_name: "Lawn Suit".into(),
                label: "3-piece".into(),
                sku: format!("LS-{id}"),
                image: None,
                unit_price: Decimal::new(price, 0),
                quantity,
                line_total: Decimal::new(price * i64::from(quantity), 0),
                available_stock: stock,
            })
            .collect();
        let subtotal = lines.iter().map(|l| l.line_total).sum();
        let item_count = lines.iter().map(|l| l.quantity).sum();
        CartView {
            lines,
            subtotal,
            item_count,
            currency: CurrencyCode::PKR,
        }
    }

    #[test]
    fn test_delivery_fee_waived_at_threshold() {
        let m = method(ShippingKind::Delivery, 250, Some(5000));
        assert_eq!(shipping_fee(&m, Decimal::new(4999, 0)), Decimal::new(250, 0));
        assert_eq!(shipping_fee(&m, Decimal::new(5000, 0)), Decimal::ZERO);

        let no_threshold = method(ShippingKind::Delivery, 250, None);
        assert_eq!(
            shipping_fee(&no_threshold, Decimal::new(100_000, 0)),
            Decimal::new(250, 0)
        );
    }

    #[test]
    fn test_quote_totals() {
        let quote = build_quote(
            cart(&[(1, 2, 1500, 5), (2, 1, 999, 1)]),
            Some(method(ShippingKind::Delivery, 200, Some(10_000))),
            None,
            None,
        )
        .unwrap();
        assert_eq!(quote.subtotal, Decimal::new(3999, 0));
        assert_eq!(quote.shipping_fee, Decimal::new(200, 0));
        assert_eq!(quote.total, Decimal::new(4199, 0));
        assert!(quote.branch.is_none());
    }

    #[test]
    fn test_quote_errors() {
        let delivery = || Some(method(ShippingKind::Delivery, 200, None));
        assert!(matches!(
            build_quote(cart(&[]), delivery(), None, None),
            Err(CheckoutError::EmptyCart)
        ));
        assert!(matches!(
            build_quote(cart(&[(1, 3, 100, 2), (2, 1, 100, 0)]), delivery(), None, None),
            Err(CheckoutError::InsufficientStock(skus)) if skus == vec!["LS-1", "LS-2"]
        ));
        assert!(matches!(
            build_quote(cart(&[(1, 1, 100, 2)]), None, None, None),
            Err(CheckoutError::UnknownShippingMethod)
        ));

        let mut inactive = method(ShippingKind::Delivery, 200, None);
        inactive.is_active = false;
        assert!(matches!(
            build_quote(cart(&[(1, 1, 100, 2)]), Some(inactive), None, None),
            Err(CheckoutError::UnknownShippingMethod)
        ));
    }

    #[test]
    fn test_pickup_requires_pickup_branch() {
        let pickup = || Some(method(ShippingKind::Pickup, 0, None));
        let one = || cart(&[(1, 1, 100, 2)]);

        assert!(matches!(
            build_quote(one(), pickup(), None, None),
            Err(CheckoutError::BranchRequired)
        ));
        assert!(matches!(
            build_quote(one(), pickup(), Some(BranchId::new(4)), Some(branch(4, false))),
            Err(CheckoutError::BranchUnavailable)
        ));
        assert!(matches!(
            build_quote(one(), pickup(), Some(BranchId::new(4)), None),
            Err(CheckoutError::BranchUnavailable)
        ));

        let quote = build_quote(one(), pickup(), Some(BranchId::new(4)), Some(branch(4, true)))
            .unwrap();
        assert_eq!(quote.shipping_fee, Decimal::ZERO);
        assert_eq!(quote.branch.unwrap().id, BranchId::new(4));
    }

    #[test]
    fn test_order_number_format() {
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 23, 59, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let number = generate_order_number(now, &mut rng);

        assert_eq!(number.len(), "DK-20260309-".len() + 6);
        assert!(number.starts_with("DK-20260309-"));
        assert!(
            number["DK-20260309-".len()..]
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "  Ali Raza ".into(),
            customer_email: "Ali@Example.PK".into(),
            customer_phone: "+92 300 1234567".into(),
            address_line1: Some("12 Canal View".into()),
            address_line2: Some("   ".into()),
            city: Some("Lahore".into()),
            postal_code: None,
            notes: None,
            payment_method: PaymentMethod::CashOnDelivery,
            shipping_method_id: ShippingMethodId::new(1),
            branch_id: None,
        }
    }

    #[test]
    fn test_validate_customer_trims_and_normalizes() {
        let details = validate_customer(&request(), ShippingKind::Delivery).unwrap();
        assert_eq!(details.name, "Ali Raza");
        assert_eq!(details.email.as_str(), "ali@example.pk");
        assert_eq!(details.address_line2, None);
    }

    #[test]
    fn test_validate_customer_address_rules() {
        let mut req = request();
        req.city = None;
        assert!(matches!(
            validate_customer(&req, ShippingKind::Delivery),
            Err(CheckoutError::Validation(msg)) if msg.contains("city")
        ));
        assert!(validate_customer(&req, ShippingKind::Pickup).is_ok());

        let mut req = request();
        req.customer_phone = "call me".into();
        assert!(validate_customer(&req, ShippingKind::Pickup).is_err());

        let mut req = request();
        req.customer_email = "nope".into();
        assert!(validate_customer(&req, ShippingKind::Pickup).is_err());
    }
}
