//! Unified error handling for admin.
//!
//! Every handler returns `Result<T, AppError>`. Responses are JSON:
//! `{"error": "..."}`. Server-side failures go to Sentry and never leak
//! their details to the client.

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
use crate::input::ValidationError;
use crate::services::AdminAuthError;

const INTERNAL_MESSAGE: &str = "Internal server error";

/// Application-level error type for the admin panel.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AdminAuthError),

    /// Request body failed validation.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Refund rejected for the order.
    #[error("Refund error: {0}")]
    Refund(#[from] RefundPlanError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

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
        RepositoryError::Invalid(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => internal(),
    }
}

impl AppError {
    /// Status code and client-safe message.
    fn response_parts(&self) -> (StatusCode, String) {
        match self {
            Self::Database(err) => repository_response(err),
            Self::Auth(err) => match err {
                AdminAuthError::InvalidCredentials | AdminAuthError::InvalidEmail(_) => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AdminAuthError::UserAlreadyExists => (StatusCode::CONFLICT, err.to_string()),
                AdminAuthError::WeakPassword(msg) | AdminAuthError::InvalidName(msg) => {
                    (StatusCode::BAD_REQUEST, msg.clone())
                }
                AdminAuthError::Repository(inner) => repository_response(inner),
                AdminAuthError::PasswordHash => internal(),
            },
            Self::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            Self::Refund(err) => match err {
                RefundPlanError::OrderNotEligible(_) | RefundPlanError::ExceedsRefundable { .. } => {
                    (StatusCode::CONFLICT, err.to_string())
                }
                RefundPlanError::NoItems
                | RefundPlanError::InvalidQuantity(_)
                | RefundPlanError::DuplicateVariant(_)
                | RefundPlanError::NotInOrder(_) => (StatusCode::BAD_REQUEST, err.to_string()),
            },
            Self::Session(_) => internal(),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.response_parts();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an admin user ID.
pub fn set_sentry_user(admin_user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(admin_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order-123".to_string());
        assert_eq!(err.to_string(), "Not found: order-123");

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
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_repository_error_mapping() {
        assert_eq!(
            get_status(RepositoryError::NotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(RepositoryError::Conflict("variant SKU LS-1 already exists".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::Invalid("stock cannot go below zero".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(ValidationError("title is required".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AdminAuthError::InvalidCredentials.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(RefundPlanError::OrderNotEligible("DK-1".into()).into()),
            StatusCode::CONFLICT
        );
    }

    #[tokio::test]
    async fn test_database_details_are_hidden() {
        let response =
            AppError::from(RepositoryError::DataCorruption("bad email in row 7".into()))
                .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, json!({ "error": "Internal server error" }));
    }
}
