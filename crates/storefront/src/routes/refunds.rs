//! Customer refund requests.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{RefundDetail, RefundLineRequest};

use crate::db::{OrderRepository, RefundRepository};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Longest accepted reason.
pub const MAX_REASON_LEN: usize = 2000;

#[derive(Debug, Deserialize)]
pub struct RefundRequest {
    pub order_number: String,
    pub email: String,
    pub reason: String,
    #[serde(default)]
    pub items: Vec<RefundLineRequest>,
}

impl RefundRequest {
    /// Checks that need no database.
    fn validate(&self) -> Result<String> {
        if self.order_number.trim().is_empty() {
            return Err(AppError::BadRequest("order_number is required".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(AppError::BadRequest("email is required".to_string()));
        }
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(AppError::BadRequest("reason is required".to_string()));
        }
        if reason.chars().count() > MAX_REASON_LEN {
            return Err(AppError::BadRequest(format!(
                "reason must be at most {MAX_REASON_LEN} characters"
            )));
        }
        if self.items.is_empty() {
            return Err(AppError::BadRequest("at least one item is required".to_string()));
        }
        Ok(reason.to_string())
    }
}

/// `POST /api/refunds`
#[instrument(skip_all, fields(order_number = %req.order_number))]
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<RefundRequest>,
) -> Result<(StatusCode, Json<RefundDetail>)> {
    let reason = req.validate()?;

    let order = OrderRepository::new(state.pool())
        .find_by_number(&req.order_number)
        .await?
        .filter(|detail| detail.order.customer_email.matches(&req.email))
        .ok_or_else(|| {
            AppError::NotFound("No order matches that order number and email".to_string())
        })?;

    let refund = RefundRepository::new(state.pool())
        .create(&order, &reason, &req.items)
        .await?;
    tracing::info!(
        refund_id = %refund.refund.id,
        amount = %refund.refund.amount,
        "Refund requested"
    );

    Ok((StatusCode::CREATED, Json(refund)))
}

#[cfg(test)]
mod tests {
    use dukaan_core::VariantId;

    use super::*;

    fn request() -> RefundRequest {
        RefundRequest {
            order_number: "DK-20260301-AB12CD".into(),
            email: "sana@example.pk".into(),
            reason: "Wrong size".into(),
            items: vec![RefundLineRequest {
                variant_id: VariantId::new(1),
                quantity: 1,
            }],
        }
    }

    #[test]
    fn test_validate_accepts_complete_request() {
        assert_eq!(request().validate().ok().as_deref(), Some("Wrong size"));
    }

    #[test]
    fn test_validate_rejects_missing_parts() {
        let mut req = request();
        req.items.clear();
        assert!(req.validate().is_err());

        let mut req = request();
        req.reason = "   ".into();
        assert!(req.validate().is_err());

        let mut req = request();
        req.reason = "x".repeat(MAX_REASON_LEN + 1);
        assert!(req.validate().is_err());
    }
}
