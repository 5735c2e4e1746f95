//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//! Responses are JSON: `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use dukaan_core::RefundPlanError;

use crate::db::RepositoryError;
use crate::db::refunds::CreateRefundError;
use crate::services::auth::AuthError;
use crate::services::cart::CartError;
use crate::services::checkout::CheckoutError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Cart operation failed.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Quote or order placement failed.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Refund request rejected.
    #[error("Refund error: {0}")]
    Refund(#[from] RefundPlanError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CreateRefundError> for AppError {
    fn from(err: CreateRefundError) -> Self {
        match err {
            CreateRefundError::Plan(inner) => Self::Refund(inner),
            CreateRefundError::Repository(inner) => Self::Database(inner),
        }
    }
}

fn internal() -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
}

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        RepositoryError::Conflict(what) => (StatusCode::CONFLICT, what.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

fn cart_response(err: &CartError) -> (StatusCode, String) {
    match err {
        CartError::VariantNotFound(_) | CartError::LineNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CartError::OutOfStock(_) => (StatusCode::CONFLICT, err.to_string()),
        CartError::InvalidQuantity => (StatusCode::BAD_REQUEST, err.to_string()),
        CartError::Session(_) | CartError::Repository(_) => internal(),
    }
}

impl AppError {
    /// Status code and client-safe message.
    fn response_parts(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Session(_) => internal(),
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
                AuthError::WeakPassword(msg) | AuthError::InvalidName(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                AuthError::InvalidEmail(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid email address".to_string())
                }
                AuthError::Repository(_) | AuthError::PasswordHash => internal(),
            },
            Self::Cart(err) => cart_response(err),
            Self::Checkout(err) => match err {
                CheckoutError::EmptyCart
                | CheckoutError::UnknownShippingMethod
                | CheckoutError::BranchRequired
                | CheckoutError::BranchUnavailable
                | CheckoutError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                CheckoutError::InsufficientStock(_) => (StatusCode::CONFLICT, err.to_string()),
                CheckoutError::Cart(inner) => cart_response(inner),
                CheckoutError::Repository(inner) => repository_response(inner),
                CheckoutError::OrderNumberExhausted => internal(),
            },
            Self::Refund(err) => match err {
                RefundPlanError::OrderNotEligible(_) | RefundPlanError::ExceedsRefundable { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                RefundPlanError::NoItems
                | RefundPlanError::InvalidQuantity(_)
                | RefundPlanError::DuplicateVariant(_)
                | RefundPlanError::NotInOrder(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.response_parts();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, String)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb
            .data
            .insert((*key).to_string(), serde_json::Value::String(value.clone()));
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use dukaan_core::VariantId;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RepositoryError::DataCorruption("test".to_string()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_domain_error_status_codes() {
        assert_eq!(
            get_status(CartError::OutOfStock("LS-1".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CartError::VariantNotFound(VariantId::new(9)).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(CheckoutError::InsufficientStock(vec!["LS-1".into()]).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::Cart(CartError::InvalidQuantity).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(RefundPlanError::NoItems.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AuthError::UserAlreadyExists.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("slug".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(
                CreateRefundError::Plan(RefundPlanError::ExceedsRefundable {
                    variant_id: VariantId::new(3),
                    available: 0,
                })
                .into()
            ),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CreateRefundError::Repository(RepositoryError::NotFound).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = AppError::from(RepositoryError::DataCorruption(
            "connection string leaked".to_string(),
        ))
        .into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_conflict_message_is_not_repeated() {
        let response =
            AppError::from(RepositoryError::Conflict("email already exists".into())).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "email already exists");
    }

    #[tokio::test]
    async fn test_insufficient_stock_lists_skus() {
        let response =
            AppError::from(CheckoutError::InsufficientStock(vec!["A".into(), "B".into()]))
                .into_response();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "insufficient stock for: A, B");
    }
}
