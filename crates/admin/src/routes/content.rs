//! Banner, branch and shipping method management.
//!
//! `PUT` replaces the whole record with a body of the same shape as `POST`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::instrument;

use dukaan_core::{Banner, BannerId, Branch, BranchId, ShippingMethod, ShippingMethodId};

use crate::db::{BannerRepository, BranchRepository, ShippingMethodRepository};
use crate::error::{AppError, Result};
use crate::input::{BannerInput, BranchInput, ShippingMethodInput};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

// =============================================================================
// Banners
// =============================================================================

/// `GET /api/banners`
#[instrument(skip_all)]
pub async fn list_banners(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Banner>>> {
    Ok(Json(BannerRepository::new(state.pool()).list().await?))
}

/// `GET /api/banners/{id}`
#[instrument(skip(state, _admin))]
pub async fn get_banner(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<BannerId>,
) -> Result<Json<Banner>> {
    BannerRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("banner {id}")))
}

/// `POST /api/banners`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_banner(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<BannerInput>,
) -> Result<(StatusCode, Json<Banner>)> {
    let new = input.validate()?;
    let banner = BannerRepository::new(state.pool()).create(&new).await?;
    tracing::info!(banner_id = %banner.id, "Banner created");
    Ok((StatusCode::CREATED, Json(banner)))
}

/// `PUT /api/banners/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_banner(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<BannerId>,
    Json(input): Json<BannerInput>,
) -> Result<Json<Banner>> {
    let new = input.validate()?;
    Ok(Json(BannerRepository::new(state.pool()).update(id, &new).await?))
}

/// `DELETE /api/banners/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_banner(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<BannerId>,
) -> Result<StatusCode> {
    BannerRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Branches
// =============================================================================

/// `GET /api/branches`
#[instrument(skip_all)]
pub async fn list_branches(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<Branch>>> {
    Ok(Json(BranchRepository::new(state.pool()).list().await?))
}

/// `GET /api/branches/{id}`
#[instrument(skip(state, _admin))]
pub async fn get_branch(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<BranchId>,
) -> Result<Json<Branch>> {
    BranchRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("branch {id}")))
}

/// `POST /api/branches`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_branch(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<BranchInput>,
) -> Result<(StatusCode, Json<Branch>)> {
    let new = input.validate()?;
    let branch = BranchRepository::new(state.pool()).create(&new).await?;
    tracing::info!(branch_id = %branch.id, city = %branch.city, "Branch created");
    Ok((StatusCode::CREATED, Json(branch)))
}

/// `PUT /api/branches/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_branch(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<BranchId>,
    Json(input): Json<BranchInput>,
) -> Result<Json<Branch>> {
    let new = input.validate()?;
    Ok(Json(BranchRepository::new(state.pool()).update(id, &new).await?))
}

/// `DELETE /api/branches/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_branch(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<BranchId>,
) -> Result<StatusCode> {
    BranchRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Shipping methods
// =============================================================================

/// `GET /api/shipping-methods`
#[instrument(skip_all)]
pub async fn list_shipping_methods(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ShippingMethod>>> {
    Ok(Json(ShippingMethodRepository::new(state.pool()).list().await?))
}

/// `GET /api/shipping-methods/{id}`
#[instrument(skip(state, _admin))]
pub async fn get_shipping_method(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ShippingMethodId>,
) -> Result<Json<ShippingMethod>> {
    ShippingMethodRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("shipping method {id}")))
}

/// `POST /api/shipping-methods`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_shipping_method(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<ShippingMethodInput>,
) -> Result<(StatusCode, Json<ShippingMethod>)> {
    let new = input.validate()?;
    let method = ShippingMethodRepository::new(state.pool())
        .create(&new)
        .await?;
    tracing::info!(shipping_method_id = %method.id, "Shipping method created");
    Ok((StatusCode::CREATED, Json(method)))
}

/// `PUT /api/shipping-methods/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_shipping_method(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ShippingMethodId>,
    Json(input): Json<ShippingMethodInput>,
) -> Result<Json<ShippingMethod>> {
    let new = input.validate()?;
    Ok(Json(
        ShippingMethodRepository::new(state.pool())
            .update(id, &new)
            .await?,
    ))
}

/// `DELETE /api/shipping-methods/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_shipping_method(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ShippingMethodId>,
) -> Result<StatusCode> {
    ShippingMethodRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
