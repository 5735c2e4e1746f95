//! Checkout routes: quote and place order.

use axum::{Json, extract::State, http::StatusCode};
use tower_sessions::Session;
use tracing::instrument;

use dukaan_core::OrderDetail;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::OptionalAuth;
use crate::routes::cart::cart_for;
use crate::services::checkout::{CheckoutRequest, CheckoutService, Quote, QuoteRequest};
use crate::state::AppState;

/// `POST /api/checkout/quote`
#[instrument(skip(state, session, user))]
pub async fn quote(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<QuoteRequest>,
) -> Result<Json<Quote>> {
    let cart = cart_for(&state, &session, user.as_ref());
    let quote = CheckoutService::new(state.pool(), cart).quote(req).await?;
    Ok(Json(quote))
}

/// `POST /api/checkout`
#[instrument(skip_all, fields(shipping_method_id = %req.shipping_method_id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let cart = cart_for(&state, &session, user.as_ref());
    let order = CheckoutService::new(state.pool(), cart)
        .place(&req, user.as_ref().map(|u| u.id))
        .await?;

    add_breadcrumb(
        "checkout",
        "Order placed",
        &[("order_number", order.order.order_number.clone())],
    );

    Ok((StatusCode::CREATED, Json(order)))
}
