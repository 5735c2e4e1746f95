//! Admin user listing (super admin only).

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::AdminUserRepository;
use crate::error::Result;
use crate::middleware::RequireSuperAdmin;
use crate::models::AdminUser;
use crate::state::AppState;

/// `GET /api/admin-users`
///
/// Accounts are created with `dukaan admin create`.
#[instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    RequireSuperAdmin(_admin): RequireSuperAdmin,
) -> Result<Json<Vec<AdminUser>>> {
    Ok(Json(AdminUserRepository::new(state.pool()).list_all().await?))
}
