//! Product, variant and stock management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{Page, PageRequest, Product, ProductDetail, ProductId, Variant, VariantId};

use super::{DEFAULT_PER_PAGE, MAX_PER_PAGE, non_blank};
use crate::db::ProductRepository;
use crate::db::catalog::AdminProductFilter;
use crate::error::{AppError, Result};
use crate::input::{ProductInput, ProductPatch, VariantInput, validate_variants};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

/// Largest single stock adjustment in either direction.
pub const MAX_STOCK_DELTA: i32 = 100_000;

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/products`
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<Product>>> {
    let filter = AdminProductFilter {
        q: non_blank(query.q),
        category: non_blank(query.category),
        active: query.active,
    };
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);

    let (items, total) = ProductRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// `GET /api/products/{id}`
#[instrument(skip(state, _admin))]
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// `POST /api/products`
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductDetail>)> {
    let new = input.validate()?;
    let product = ProductRepository::new(state.pool()).create(&new).await?;

    tracing::info!(
        product_id = %product.product.id,
        slug = %product.product.slug,
        variants = product.variants.len(),
        "Product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PATCH /api/products/{id}`
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ProductDetail>> {
    let changes = patch.validate()?;
    let product = ProductRepository::new(state.pool())
        .update(id, &changes)
        .await?;
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct ReplaceVariantsRequest {
    pub variants: Vec<VariantInput>,
}

/// `PUT /api/products/{id}/variants`
///
/// Listed variants with an id are updated, those without are created and
/// every other variant of the product is deleted.
#[instrument(skip(state, admin, req), fields(admin_id = %admin.id))]
pub async fn replace_variants(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<ProductId>,
    Json(req): Json<ReplaceVariantsRequest>,
) -> Result<Json<ProductDetail>> {
    let variants = validate_variants(req.variants)?;
    let product = ProductRepository::new(state.pool())
        .replace_variants(id, &variants)
        .await?;
    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    pub delta: i32,
}

impl StockAdjustment {
    fn validate(&self) -> Result<i32> {
        if self.delta == 0 {
            return Err(AppError::BadRequest("delta must not be zero".to_string()));
        }
        if self.delta.abs() > MAX_STOCK_DELTA {
            return Err(AppError::BadRequest(format!(
                "delta must be between -{MAX_STOCK_DELTA} and {MAX_STOCK_DELTA}"
            )));
        }
        Ok(self.delta)
    }
}

/// `POST /api/variants/{id}/stock`
#[instrument(skip(state, admin, adjustment), fields(admin_id = %admin.id))]
pub async fn adjust_stock(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(variant_id): Path<VariantId>,
    Json(adjustment): Json<StockAdjustment>,
) -> Result<Json<Variant>> {
    let delta = adjustment.validate()?;
    let variant = ProductRepository::new(state.pool())
        .adjust_stock(variant_id, delta)
        .await?;

    tracing::info!(
        variant_id = %variant_id,
        delta,
        stock = variant.stock,
        "Stock adjusted"
    );
    Ok(Json(variant))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stock_delta_bounds() {
        assert!(StockAdjustment { delta: 0 }.validate().is_err());
        assert!(StockAdjustment { delta: -3 }.validate().is_ok());
        assert!(
            StockAdjustment {
                delta: MAX_STOCK_DELTA + 1
            }
            .validate()
            .is_err()
        );
    }
}
