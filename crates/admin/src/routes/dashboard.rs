//! Dashboard summary.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::db::dashboard::DashboardSummary;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// `GET /api/dashboard`
#[instrument(skip_all)]
pub async fn summary(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<DashboardSummary>> {
    Ok(Json(DashboardRepository::new(state.pool()).summary().await?))
}
