//! Updates to orders, refunds and job applications.

use serde::Deserialize;

use dukaan_core::{ApplicationStatus, OrderStatus, RefundLineRequest, RefundStatus};

use super::{ValidationError, default_true, double_option, optional, required};

/// Longest reason or note accepted on a refund.
pub const MAX_REFUND_TEXT_LEN: usize = 2000;

fn bounded(text: String, field: &str) -> Result<String, ValidationError> {
    if text.chars().count() > MAX_REFUND_TEXT_LEN {
        return Err(ValidationError::new(format!(
            "{field} must be at most {MAX_REFUND_TEXT_LEN} characters"
        )));
    }
    Ok(text)
}

/// Order update. The status is set as given; there are no transition
/// rules. `tracking_number` and `courier` may be cleared with `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderPatch {
    pub status: Option<OrderStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub tracking_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub courier: Option<Option<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderChanges {
    pub status: Option<OrderStatus>,
    pub tracking_number: Option<Option<String>>,
    pub courier: Option<Option<String>>,
}

impl OrderChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl OrderPatch {
    /// Trims text fields; blank strings clear them.
    #[must_use]
    pub fn validate(self) -> OrderChanges {
        OrderChanges {
            status: self.status,
            tracking_number: self.tracking_number.map(optional),
            courier: self.courier.map(optional),
        }
    }
}

/// Refund update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RefundPatch {
    pub status: Option<RefundStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub admin_note: Option<Option<String>>,
    pub restock: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefundChanges {
    pub status: Option<RefundStatus>,
    pub admin_note: Option<Option<String>>,
    pub restock: Option<bool>,
}

impl RefundPatch {
    /// # Errors
    ///
    /// Returns an error if the note is too long.
    pub fn validate(self) -> Result<RefundChanges, ValidationError> {
        let admin_note = self
            .admin_note
            .map(|note| optional(note).map(|n| bounded(n, "admin_note")).transpose())
            .transpose()?;
        Ok(RefundChanges {
            status: self.status,
            admin_note,
            restock: self.restock,
        })
    }
}

/// Refund opened by staff on behalf of a customer.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminRefundInput {
    pub reason: String,
    pub items: Vec<RefundLineRequest>,
    pub admin_note: Option<String>,
    #[serde(default = "default_true")]
    pub restock: bool,
}

/// A validated staff refund; items are checked against the order later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAdminRefund {
    pub reason: String,
    pub items: Vec<RefundLineRequest>,
    pub admin_note: Option<String>,
    pub restock: bool,
}

impl AdminRefundInput {
    /// # Errors
    ///
    /// Returns an error for a blank or overlong reason or note, or when no
    /// items are listed.
    pub fn validate(self) -> Result<NewAdminRefund, ValidationError> {
        if self.items.is_empty() {
            return Err(ValidationError::new("at least one item is required"));
        }
        let reason = bounded(required(&self.reason, "reason")?, "reason")?;
        let admin_note = optional(self.admin_note)
            .map(|n| bounded(n, "admin_note"))
            .transpose()?;
        Ok(NewAdminRefund {
            reason,
            items: self.items,
            admin_note,
            restock: self.restock,
        })
    }
}

/// Job application status change.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApplicationStatusInput {
    pub status: ApplicationStatus,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_order_patch_clears_and_trims() {
        let patch: OrderPatch = serde_json::from_value(json!({
            "status": "shipped",
            "tracking_number": " 7781234 ",
            "courier": null
        }))
        .unwrap();
        let changes = patch.validate();
        assert_eq!(changes.status, Some(OrderStatus::Shipped));
        assert_eq!(changes.tracking_number, Some(Some("7781234".into())));
        assert_eq!(changes.courier, Some(None));
        assert!(!changes.is_empty());

        let empty: OrderPatch = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().is_empty());
    }

    #[test]
    fn test_unknown_order_status_rejected() {
        assert!(serde_json::from_value::<OrderPatch>(json!({ "status": "lost" })).is_err());
    }

    #[test]
    fn test_refund_patch_note_limits() {
        let patch: RefundPatch =
            serde_json::from_value(json!({ "admin_note": "x".repeat(2001) })).unwrap();
        assert!(patch.validate().is_err());

        let patch: RefundPatch =
            serde_json::from_value(json!({ "status": "approved", "restock": false })).unwrap();
        let changes = patch.validate().unwrap();
        assert_eq!(changes.status, Some(RefundStatus::Approved));
        assert_eq!(changes.restock, Some(false));
        assert_eq!(changes.admin_note, None);
    }

    #[test]
    fn test_admin_refund_requires_reason() {
        let input: AdminRefundInput = serde_json::from_value(json!({
            "reason": "  ",
            "items": [{ "variant_id": 1, "quantity": 1 }]
        }))
        .unwrap();
        assert!(input.validate().is_err());

        let input: AdminRefundInput = serde_json::from_value(json!({
            "reason": "Damaged in transit",
            "items": [{ "variant_id": 1, "quantity": 1 }]
        }))
        .unwrap();
        let refund = input.validate().unwrap();
        assert!(refund.restock);
        assert_eq!(refund.items.len(), 1);
    }
}
