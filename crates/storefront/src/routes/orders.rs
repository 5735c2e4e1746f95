//! Order history and guest order tracking.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::Order;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::tracking::{TrackedOrder, TrackingError, track_order};
use crate::state::AppState;

/// `GET /api/orders`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(user.id)
        .await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub order_number: Option<String>,
    pub email: Option<String>,
}

fn required(value: Option<&str>, name: &str) -> Result<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
}

/// `GET /api/orders/track?order_number=&email=`
#[instrument(skip_all)]
pub async fn track(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackedOrder>> {
    let order_number = required(query.order_number.as_deref(), "order_number")?;
    let email = required(query.email.as_deref(), "email")?;

    match track_order(state.pool(), state.tcs(), &order_number, &email).await {
        Ok(tracked) => Ok(Json(tracked)),
        Err(TrackingError::NotFound) => Err(AppError::NotFound(
            "No order matches that order number and email".to_string(),
        )),
        Err(TrackingError::Repository(e)) => Err(e.into()),
    }
}
