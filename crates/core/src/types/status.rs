//! Status and kind enums for persisted records.
//!
//! Statuses are stored as Postgres enum types in the `shop` / `admin` schemas
//! and travel over JSON as `snake_case` strings. Admin actions set them
//! directly; the only status with a side effect is a refund reaching
//! `approved`/`refunded` (restocking).

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when parsing a status from an unknown string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
}

impl ParseStatusError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.order_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether a customer may open a refund request against the order.
    #[must_use]
    pub const fn accepts_refund_requests(self) -> bool {
        matches!(self, Self::Shipped | Self::Delivered)
    }
}

/// Refund request status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.refund_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    #[default]
    Requested,
    Approved,
    Rejected,
    Refunded,
}

impl RefundStatus {
    pub const ALL: [Self; 4] = [
        Self::Requested,
        Self::Approved,
        Self::Rejected,
        Self::Refunded,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Refunded => "refunded",
        }
    }

    /// Statuses at which returned goods go back on the shelf.
    #[must_use]
    pub const fn triggers_restock(self) -> bool {
        matches!(self, Self::Approved | Self::Refunded)
    }
}

/// Job application review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.application_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewing,
    Shortlisted,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const ALL: [Self; 5] = [
        Self::New,
        Self::Reviewing,
        Self::Shortlisted,
        Self::Rejected,
        Self::Hired,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Reviewing => "reviewing",
            Self::Shortlisted => "shortlisted",
            Self::Rejected => "rejected",
            Self::Hired => "hired",
        }
    }
}

/// How a shipping method hands the parcel to the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.shipping_kind", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ShippingKind {
    /// Courier delivery to the customer's address.
    #[default]
    Delivery,
    /// Customer collects from a branch.
    Pickup,
}

impl ShippingKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Delivery => "delivery",
            Self::Pickup => "pickup",
        }
    }
}

/// Payment method chosen at checkout. No payment is captured online.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "shop.payment_method", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    CashOnDelivery,
    BankTransfer,
}

impl PaymentMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CashOnDelivery => "cash_on_delivery",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

/// Admin role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin.admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Everything, including managing other admins.
    SuperAdmin,
    /// Full access to store management.
    Admin,
    /// Read-only access.
    Viewer,
}

impl AdminRole {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SuperAdmin => "super_admin",
            Self::Admin => "admin",
            Self::Viewer => "viewer",
        }
    }

    /// Whether the role may create, update or delete records.
    #[must_use]
    pub const fn can_write(self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }
}

macro_rules! impl_display_from_str {
    ($ty:ident, $kind:literal, [$($variant:ident),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseStatusError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == Self::$variant.as_str() {
                        return Ok(Self::$variant);
                    }
                )+
                Err(ParseStatusError::new($kind, s))
            }
        }
    };
}

impl_display_from_str!(
    OrderStatus,
    "order status",
    [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled]
);
impl_display_from_str!(
    RefundStatus,
    "refund status",
    [Requested, Approved, Rejected, Refunded]
);
impl_display_from_str!(
    ApplicationStatus,
    "application status",
    [New, Reviewing, Shortlisted, Rejected, Hired]
);
impl_display_from_str!(ShippingKind, "shipping kind", [Delivery, Pickup]);
impl_display_from_str!(
    PaymentMethod,
    "payment method",
    [CashOnDelivery, BankTransfer]
);
impl_display_from_str!(AdminRole, "admin role", [SuperAdmin, Admin, Viewer]);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_round_trips_through_str() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("lost".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap();
        assert_eq!(json, "\"cash_on_delivery\"");
        let role: AdminRole = serde_json::from_str("\"super_admin\"").unwrap();
        assert_eq!(role, AdminRole::SuperAdmin);
    }

    #[test]
    fn test_restock_statuses() {
        assert!(RefundStatus::Approved.triggers_restock());
        assert!(RefundStatus::Refunded.triggers_restock());
        assert!(!RefundStatus::Requested.triggers_restock());
        assert!(!RefundStatus::Rejected.triggers_restock());
    }

    #[test]
    fn test_refundable_order_statuses() {
        assert!(OrderStatus::Delivered.accepts_refund_requests());
        assert!(OrderStatus::Shipped.accepts_refund_requests());
        assert!(!OrderStatus::Pending.accepts_refund_requests());
        assert!(!OrderStatus::Cancelled.accepts_refund_requests());
    }

    #[test]
    fn test_viewer_is_read_only() {
        assert!(!AdminRole::Viewer.can_write());
        assert!(AdminRole::Admin.can_write());
        assert_eq!(
            "viewer".parse::<AdminRole>().unwrap().to_string(),
            "viewer"
        );
    }

    #[test]
    fn test_parse_error_message() {
        let err = "gone".parse::<RefundStatus>().unwrap_err();
        assert_eq!(err.to_string(), "invalid refund status: gone");
    }
}
