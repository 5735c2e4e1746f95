//! Customer authentication routes.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, Customer};
use crate::services::auth::AuthService;
use crate::services::cart::{CartView, merge_guest_cart};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body returned after register and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: CurrentUser,
    /// Cart after merging the guest cart, when the merge succeeded.
    pub cart: Option<CartView>,
}

/// Log the customer into this session.
///
/// The session id is rotated first. Merging the guest cart is best effort:
/// a failure is logged and the login still succeeds.
async fn start_session(
    state: &AppState,
    session: &Session,
    customer: Customer,
) -> Result<SessionResponse> {
    session.cycle_id().await?;

    let cart = match merge_guest_cart(state.pool(), session, customer.id).await {
        Ok(cart) => Some(cart),
        Err(e) => {
            tracing::warn!(error = %e, customer_id = %customer.id, "Guest cart merge failed");
            None
        }
    };

    let user = CurrentUser {
        id: customer.id,
        email: customer.email,
        name: customer.name,
    };
    set_current_user(session, &user).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(SessionResponse { user, cart })
}

/// `POST /api/auth/register`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<SessionResponse>)> {
    let customer = AuthService::new(state.pool())
        .register(&req.email, &req.password, &req.name)
        .await?;
    let response = start_session(&state, &session, customer).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `POST /api/auth/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<SessionResponse>> {
    let customer = AuthService::new(state.pool())
        .login(&req.email, &req.password)
        .await
        .inspect_err(|e| tracing::info!(error = %e, "Login failed"))?;

    tracing::info!(customer_id = %customer.id, "Customer logged in");
    let response = start_session(&state, &session, customer).await?;
    Ok(Json(response))
}

/// `POST /api/auth/logout`
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me`
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
