//! Cart routes.
//!
//! Guests keep their cart in the session; logged-in customers in the
//! database. The client keeps an optimistic copy and may push the whole
//! thing back with `PUT /api/cart` (last write wins).

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use dukaan_core::VariantId;

use crate::error::{AppError, Result};
use crate::middleware::OptionalAuth;
use crate::models::CurrentUser;
use crate::services::cart::{CartItem, CartOwner, CartService, CartView};
use crate::state::AppState;

/// Cart service for whoever is calling.
pub fn cart_for<'a>(
    state: &'a AppState,
    session: &'a Session,
    user: Option<&CurrentUser>,
) -> CartService<'a> {
    let owner = user.map_or(CartOwner::Guest(session), |u| CartOwner::Customer(u.id));
    CartService::new(state.pool(), owner)
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub variant_id: VariantId,
    pub quantity: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceCartRequest {
    pub items: Vec<CartItem>,
}

/// `GET /api/cart`
#[instrument(skip_all)]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = cart_for(&state, &session, user.as_ref()).view().await?;
    Ok(Json(cart))
}

/// `POST /api/cart/items`
#[instrument(skip(state, session, user))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartView>> {
    let quantity = req.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }
    let cart = cart_for(&state, &session, user.as_ref())
        .add(req.variant_id, quantity)
        .await?;
    Ok(Json(cart))
}

/// `PATCH /api/cart/items/{variant_id}`; quantity 0 removes the line.
#[instrument(skip(state, session, user))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(variant_id): Path<VariantId>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let cart = cart_for(&state, &session, user.as_ref())
        .set_quantity(variant_id, req.quantity)
        .await?;
    Ok(Json(cart))
}

/// `DELETE /api/cart/items/{variant_id}`
#[instrument(skip(state, session, user))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(variant_id): Path<VariantId>,
) -> Result<Json<CartView>> {
    let cart = cart_for(&state, &session, user.as_ref())
        .remove(variant_id)
        .await?;
    Ok(Json(cart))
}

/// `PUT /api/cart`
#[instrument(skip_all, fields(lines = req.items.len()))]
pub async fn replace(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Json(req): Json<ReplaceCartRequest>,
) -> Result<Json<CartView>> {
    let cart = cart_for(&state, &session, user.as_ref())
        .replace(&req.items)
        .await?;
    Ok(Json(cart))
}

/// `DELETE /api/cart`
#[instrument(skip_all)]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<StatusCode> {
    cart_for(&state, &session, user.as_ref()).clear().await?;
    Ok(StatusCode::NO_CONTENT)
}
