//! Storefront content: banners, branches, shipping methods.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{Banner, Branch, ShippingMethod};

use crate::db::ContentRepository;
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/banners`
#[instrument(skip(state))]
pub async fn banners(State(state): State<AppState>) -> Result<Json<Vec<Banner>>> {
    let banners = ContentRepository::new(state.pool())
        .live_banners(Utc::now())
        .await?;
    Ok(Json(banners))
}

#[derive(Debug, Deserialize)]
pub struct BranchQuery {
    pub city: Option<String>,
}

/// `GET /api/branches?city=`
#[instrument(skip(state))]
pub async fn branches(
    State(state): State<AppState>,
    Query(query): Query<BranchQuery>,
) -> Result<Json<Vec<Branch>>> {
    let city = query.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let branches = ContentRepository::new(state.pool())
        .active_branches(city)
        .await?;
    Ok(Json(branches))
}

/// `GET /api/shipping-methods`
#[instrument(skip(state))]
pub async fn shipping_methods(State(state): State<AppState>) -> Result<Json<Vec<ShippingMethod>>> {
    let methods = ContentRepository::new(state.pool())
        .active_shipping_methods()
        .await?;
    Ok(Json(methods))
}
