//! Guest order lookup with courier tracking.

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use dukaan_core::OrderDetail;

use crate::db::{OrderRepository, RepositoryError};
use crate::services::tcs::TcsClient;

/// Errors from looking up an order.
#[derive(Debug, Error)]
pub enum TrackingError {
    /// Unknown order number or email mismatch. Both read the same.
    #[error("order not found")]
    NotFound,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// An order with the courier's view of its shipment.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedOrder {
    #[serde(flatten)]
    pub order: OrderDetail,
    pub tracking: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracking_error: Option<String>,
}

/// Find an order by number and email, then ask TCS about its shipment.
///
/// Courier failures do not fail the lookup; they are reported in
/// `tracking_error`.
///
/// # Errors
///
/// `NotFound` for an unknown order or a different email, or a repository
/// error.
#[instrument(skip(pool, tcs, email))]
pub async fn track_order(
    pool: &PgPool,
    tcs: &TcsClient,
    order_number: &str,
    email: &str,
) -> Result<TrackedOrder, TrackingError> {
    let order = OrderRepository::new(pool)
        .find_by_number(order_number)
        .await?
        .filter(|detail| detail.order.customer_email.matches(email))
        .ok_or(TrackingError::NotFound)?;

    let consignment = order
        .order
        .tracking_number
        .as_deref()
        .map(str::trim)
        .filter(|cn| !cn.is_empty())
        .map(String::from);

    let Some(consignment) = consignment else {
        return Ok(TrackedOrder {
            order,
            tracking: None,
            tracking_error: None,
        });
    };

    match tcs.track(&consignment).await {
        Ok(tracking) => Ok(TrackedOrder {
            order,
            tracking: Some(tracking),
            tracking_error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "TCS tracking lookup failed");
            Ok(TrackedOrder {
                order,
                tracking: None,
                tracking_error: Some("tracking is temporarily unavailable".to_string()),
            })
        }
    }
}
