//! Admin router tests: login gate, role checks and body validation.
//!
//! A test-only `/test/session` route puts an admin straight into the
//! in-memory session, standing in for a password login.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower::ServiceExt;
use tower_sessions::{MemoryStore, Session};

use dukaan_admin::middleware::{session_layer, set_current_admin};
use dukaan_admin::models::CurrentAdmin;
use dukaan_admin::state::AppState;
use dukaan_integration_tests::{admin_config, json_body, lazy_pool, request, session_cookie};

async fn start_session(session: Session, Json(admin): Json<CurrentAdmin>) -> StatusCode {
    set_current_admin(&session, &admin).await.unwrap();
    StatusCode::NO_CONTENT
}

fn admin_app() -> Router {
    dukaan_admin::routes::routes()
        .route("/test/session", post(start_session))
        .layer(session_layer(MemoryStore::default(), false))
        .with_state(AppState::new(admin_config(), lazy_pool()))
}

/// Log in as an admin with the given role and return the session cookie.
async fn login_as(app: &Router, role: &str) -> String {
    let admin = json!({
        "id": 7,
        "email": "staff@dukaan.pk",
        "name": "Staff Member",
        "role": role
    });
    let response = app
        .clone()
        .oneshot(request("POST", "/test/session", Some(&admin), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    session_cookie(&response).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&Value>, cookie: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request(method, uri, body, Some(cookie)))
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

// ============================================================================
// Login gate
// ============================================================================

#[tokio::test]
async fn test_api_requires_login() {
    let app = admin_app();
    for uri in ["/api/dashboard", "/api/products", "/api/orders", "/api/refunds"] {
        let response = app
            .clone()
            .oneshot(request("GET", uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(json_body(response).await["error"], "Login required");
    }
}

#[tokio::test]
async fn test_me_requires_login() {
    let response = admin_app()
        .oneshot(request("GET", "/auth/me", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_requires_email_and_password() {
    let body = json!({ "email": "  ", "password": "" });
    let response = admin_app()
        .oneshot(request("POST", "/auth/login", Some(&body), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "email and password are required"
    );
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = admin_app();
    let cookie = login_as(&app, "admin").await;

    let response = app
        .clone()
        .oneshot(request("POST", "/auth/logout", None, Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let body = json!({ "delta": 0 });
    let (status, _) = send(&app, "POST", "/api/variants/1/stock", Some(&body), &cookie).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Roles
// ============================================================================

#[tokio::test]
async fn test_viewer_cannot_write() {
    let app = admin_app();
    let cookie = login_as(&app, "viewer").await;

    let product = json!({ "name": "Lawn Suit", "category": "women", "base_price": 4500 });
    let cases = [
        ("POST", "/api/products", Some(product)),
        ("PATCH", "/api/products/1", Some(json!({ "is_active": false }))),
        ("DELETE", "/api/products/1", None),
        ("POST", "/api/variants/1/stock", Some(json!({ "delta": 5 }))),
        ("DELETE", "/api/banners/1", None),
        ("PATCH", "/api/orders/1", Some(json!({ "status": "shipped" }))),
        ("PATCH", "/api/refunds/1", Some(json!({ "status": "approved" }))),
        ("DELETE", "/api/applications/1", None),
    ];
    for (method, uri, body) in cases {
        let (status, body) = send(&app, method, uri, body.as_ref(), &cookie).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(body["error"], "Your role does not allow this action");
    }
}

#[tokio::test]
async fn test_admin_users_need_super_admin() {
    let app = admin_app();
    for role in ["viewer", "admin"] {
        let cookie = login_as(&app, role).await;
        let (status, _) = send(&app, "GET", "/api/admin-users", None, &cookie).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{role}");
    }
}

// ============================================================================
// Validation (runs before the database)
// ============================================================================

#[tokio::test]
async fn test_product_validation() {
    let app = admin_app();
    let cookie = login_as(&app, "admin").await;

    let negative = json!({ "name": "Lawn Suit", "category": "women", "base_price": -1 });
    let (status, body) = send(&app, "POST", "/api/products", Some(&negative), &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "base_price must be >= 0");

    let bad_image = json!({
        "name": "Lawn Suit",
        "category": "women",
        "base_price": 4500,
        "images": ["javascript:alert(1)"]
    });
    let (status, _) = send(&app, "POST", "/api/products", Some(&bad_image), &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stock_delta_validation() {
    let app = admin_app();
    let cookie = login_as(&app, "super_admin").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/variants/1/stock",
        Some(&json!({ "delta": 0 })),
        &cookie,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "delta must not be zero");

    let (status, _) = send(
        &app,
        "POST",
        "/api/variants/1/stock",
        Some(&json!({ "delta": 1_000_000 })),
        &cookie,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_staff_refund_requires_items() {
    let app = admin_app();
    let cookie = login_as(&app, "admin").await;

    let body = json!({ "reason": "Damaged in transit", "items": [] });
    let (status, body) = send(&app, "POST", "/api/orders/1/refunds", Some(&body), &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "at least one item is required");
}

#[tokio::test]
async fn test_banner_validation() {
    let app = admin_app();
    let cookie = login_as(&app, "admin").await;

    let body = json!({
        "title": "Eid Sale",
        "image_url": "https://cdn.dukaan.pk/eid.jpg",
        "starts_at": "2026-04-01T00:00:00Z",
        "ends_at": "2026-03-01T00:00:00Z"
    });
    let (status, body) = send(&app, "POST", "/api/banners", Some(&body), &cookie).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "ends_at must be after starts_at");
}
