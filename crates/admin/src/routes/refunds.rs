//! Refund review.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{Page, PageRequest, Refund, RefundDetail, RefundId, RefundStatus};

use super::{DEFAULT_PER_PAGE, MAX_PER_PAGE};
use crate::db::RefundRepository;
use crate::error::{AppError, Result};
use crate::input::RefundPatch;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RefundListQuery {
    pub status: Option<RefundStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/refunds`
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<RefundListQuery>,
) -> Result<Json<Page<Refund>>> {
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);
    let (items, total) = RefundRepository::new(state.pool())
        .list(query.status, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// `GET /api/refunds/{id}`
#[instrument(skip(state, _admin))]
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<RefundId>,
) -> Result<Json<RefundDetail>> {
    RefundRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("refund {id}")))
}

/// `PATCH /api/refunds/{id}`
///
/// Moving to `approved` or `refunded` with `restock` on puts the returned
/// units back into stock, once.
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<RefundId>,
    Json(patch): Json<RefundPatch>,
) -> Result<Json<RefundDetail>> {
    let changes = patch.validate()?;
    let refund = RefundRepository::new(state.pool())
        .update(id, &changes)
        .await?;

    tracing::info!(
        refund_id = %id,
        status = refund.refund.status.as_str(),
        restocked = refund.refund.restocked,
        "Refund updated"
    );
    Ok(Json(refund))
}
