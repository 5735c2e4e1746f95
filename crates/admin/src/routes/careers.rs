//! Job application review.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use dukaan_core::{ApplicationStatus, JobApplication, JobApplicationId, Page, PageRequest};

use super::{DEFAULT_PER_PAGE, MAX_PER_PAGE, non_blank};
use crate::db::JobApplicationRepository;
use crate::db::careers::ApplicationFilter;
use crate::error::{AppError, Result};
use crate::input::ApplicationStatusInput;
use crate::middleware::{RequireAdmin, RequireWriter};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ApplicationListQuery {
    pub status: Option<ApplicationStatus>,
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// `GET /api/applications`
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<Page<JobApplication>>> {
    let filter = ApplicationFilter {
        status: query.status,
        q: non_blank(query.q),
    };
    let page = PageRequest::new(query.page, query.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);

    let (items, total) = JobApplicationRepository::new(state.pool())
        .list(&filter, page)
        .await?;
    Ok(Json(Page::new(items, page, total)))
}

/// `GET /api/applications/{id}`
#[instrument(skip(state, _admin))]
pub async fn get(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<JobApplicationId>,
) -> Result<Json<JobApplication>> {
    JobApplicationRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("application {id}")))
}

/// `PATCH /api/applications/{id}`
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<JobApplicationId>,
    Json(input): Json<ApplicationStatusInput>,
) -> Result<Json<JobApplication>> {
    let application = JobApplicationRepository::new(state.pool())
        .update_status(id, input.status)
        .await?;
    Ok(Json(application))
}

/// `DELETE /api/applications/{id}`
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireWriter(admin): RequireWriter,
    Path(id): Path<JobApplicationId>,
) -> Result<StatusCode> {
    JobApplicationRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
