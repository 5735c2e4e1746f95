//! Admin login, logout and identity.

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::db::AdminUserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAdmin, clear_current_admin, set_current_admin};
use crate::models::{AdminUser, CurrentAdmin};
use crate::services::AdminAuthService;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "email and password are required".to_string(),
        ));
    }

    let user = AdminAuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Admin login failed"))?;

    session.cycle_id().await?;
    let admin = CurrentAdmin {
        id: user.id,
        email: user.email,
        name: user.name,
        role: user.role,
    };
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));

    tracing::info!(admin_id = %admin.id, role = admin.role.as_str(), "Admin logged in");
    Ok(Json(admin))
}

/// `POST /auth/logout`
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_admin(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /auth/me`
///
/// Re-reads the account so a deleted admin is logged out.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn me(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
) -> Result<Json<AdminUser>> {
    let Some(user) = AdminUserRepository::new(state.pool())
        .get_by_id(admin.id)
        .await?
    else {
        session.flush().await?;
        return Err(AppError::Unauthorized("Login required".to_string()));
    };
    Ok(Json(user))
}
