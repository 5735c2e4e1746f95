//! Order management and staff-initiated refunds.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{Order, OrderDetail, OrderId, OrderStatus, Page, PageRequest, RefundDetail};

use super::{DEFAULT_PER_PAGE, MAX_PER_PAGE, non_blank};
use crate::db::orders::OrderFilter;
use crate::db::{OrderRepository, RefundRepository};
use crate::error::{AppError, Result};
use crate::input::{AdminRefundInput, OrderPatch};
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/orders`
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Page<Order>>> {
    let filter = OrderFilter {
        status: query.status,
        q: non_blank(query.q),
    };
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);

    let (items, total) = OrderRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// `GET /api/orders/{id}`
#[instrument(skip(state, _admin))]
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))
}

/// `PATCH /api/orders/{id}`
#[instrument(skip(state, admin, patch), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<OrderId>,
    Json(patch): Json<OrderPatch>,
) -> Result<Json<OrderDetail>> {
    let changes = patch.validate();
    let order = OrderRepository::new(state.pool())
        .update(id, &changes)
        .await?;

    if let Some(status) = changes.status {
        tracing::info!(
            order_number = %order.order.order_number,
            status = status.as_str(),
            "Order status set"
        );
    }
    Ok(Json(order))
}

/// `POST /api/orders/{id}/refunds`
///
/// Same checks as a customer request, minus the email match.
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn create_refund(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<OrderId>,
    Json(input): Json<AdminRefundInput>,
) -> Result<(StatusCode, Json<RefundDetail>)> {
    let new = input.validate()?;

    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("order {id}")))?;

    let refund = RefundRepository::new(state.pool())
        .create(
            &order,
            &new.reason,
            &new.items,
            new.admin_note.as_deref(),
            new.restock,
        )
        .await?;

    tracing::info!(
        refund_id = %refund.refund.id,
        order_number = %order.order.order_number,
        amount = %refund.refund.amount,
        "Refund opened by staff"
    );
    Ok((StatusCode::CREATED, Json(refund)))
}
