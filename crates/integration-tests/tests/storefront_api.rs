//! Storefront router tests.
//!
//! Every request here is answered before the database is touched, so the
//! lazy pool never connects.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use dukaan_integration_tests::{json_body, request, storefront_app};

// ============================================================================
// Cart and checkout
// ============================================================================

#[tokio::test]
async fn test_new_guest_has_empty_cart() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/cart", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["lines"], json!([]));
    assert_eq!(body["item_count"], 0);
}

#[tokio::test]
async fn test_add_zero_quantity_rejected() {
    let body = json!({ "variant_id": 1, "quantity": 0 });
    let response = storefront_app()
        .oneshot(request("POST", "/api/cart/items", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "quantity must be at least 1"
    );
}

#[tokio::test]
async fn test_quote_on_empty_cart_is_bad_request() {
    let body = json!({ "shipping_method_id": 1 });
    let response = storefront_app()
        .oneshot(request("POST", "/api/checkout/quote", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_checkout_on_empty_cart_is_bad_request() {
    let body = json!({
        "customer_name": "Sana Mir",
        "customer_email": "sana@example.pk",
        "customer_phone": "03001234567",
        "address_line1": "House 4, Street 9",
        "city": "Lahore",
        "payment_method": "cash_on_delivery",
        "shipping_method_id": 1
    });
    let response = storefront_app()
        .oneshot(request("POST", "/api/checkout", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Auth
// ============================================================================

#[tokio::test]
async fn test_order_history_requires_login() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/orders", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_login() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/auth/me", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_short_password() {
    let body = json!({ "email": "sana@example.pk", "password": "short", "name": "Sana" });
    let response = storefront_app()
        .oneshot(request("POST", "/api/auth/register", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = json_body(response).await["error"].as_str().unwrap().to_string();
    assert!(error.contains("at least 8"), "{error}");
}

#[tokio::test]
async fn test_register_rejects_bad_email() {
    let body = json!({ "email": "not-an-email", "password": "long enough pw", "name": "Sana" });
    let response = storefront_app()
        .oneshot(request("POST", "/api/auth/register", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_without_session_is_no_content() {
    let response = storefront_app()
        .oneshot(request("POST", "/api/auth/logout", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

// ============================================================================
// Orders, refunds and careers
// ============================================================================

#[tokio::test]
async fn test_track_requires_both_fields() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/orders/track?order_number=DK-1001", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "email is required");
}

#[tokio::test]
async fn test_refund_requires_items() {
    let body = json!({
        "order_number": "DK-1001",
        "email": "sana@example.pk",
        "reason": "Wrong size",
        "items": []
    });
    let response = storefront_app()
        .oneshot(request("POST", "/api/refunds", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "at least one item is required"
    );
}

#[tokio::test]
async fn test_job_application_validates_resume_url() {
    let body = json!({
        "full_name": "Hamza Iqbal",
        "email": "hamza@example.pk",
        "phone": "03211234567",
        "position": "Store Associate",
        "resume_url": "ftp://files.example.pk/cv.pdf"
    });
    let response = storefront_app()
        .oneshot(request("POST", "/api/careers/applications", Some(&body), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "resume_url must use http or https"
    );
}

// ============================================================================
// Assistant
// ============================================================================

#[tokio::test]
async fn test_tool_registry_lists_tools() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/assistant/tools", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|tool| tool["name"].as_str())
        .collect();
    assert!(names.contains(&"search_products"));
    assert!(names.contains(&"search_knowledge"));
    assert!(names.contains(&"track_order"));
}

#[tokio::test]
async fn test_unknown_tool_is_not_found() {
    let response = storefront_app()
        .oneshot(request("POST", "/api/assistant/tools/delete_everything", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_knowledge_tool_runs_without_database() {
    let body = json!({ "query": "refund bank transfer", "top_k": 2 });
    let response = storefront_app()
        .oneshot(request(
            "POST",
            "/api/assistant/tools/search_knowledge",
            Some(&body),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_error"], false);
    assert!(body["content"]["results"].as_array().unwrap().len() <= 2);
}

#[tokio::test]
async fn test_tool_input_errors_are_results() {
    let response = storefront_app()
        .oneshot(request(
            "POST",
            "/api/assistant/tools/search_knowledge",
            Some(&json!({})),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["is_error"], true);
    assert!(body["content"]["error"].is_string());
}

#[tokio::test]
async fn test_search_requires_query() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/assistant/search?q=%20", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_respects_top_k() {
    let response = storefront_app()
        .oneshot(request("GET", "/api/assistant/search?q=delivery&top_k=1", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(json_body(response).await.as_array().unwrap().len() <= 1);
}

#[tokio::test]
async fn test_ask_rejects_blank_message() {
    let response = storefront_app()
        .oneshot(request("POST", "/api/assistant/ask", Some(&json!({ "message": "  " })), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
