//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST   /auth/login                   - Email + password login
//! POST   /auth/logout                  - Logout
//! GET    /auth/me                      - Current admin
//!
//! # Dashboard
//! GET    /api/dashboard                - Counters and low stock
//!
//! # Catalog
//! GET    /api/products                 - List (q, category, active, page)
//! POST   /api/products                 - Create with variants
//! GET    /api/products/{id}            - Detail with variants
//! PATCH  /api/products/{id}            - Partial update
//! DELETE /api/products/{id}            - Delete
//! PUT    /api/products/{id}/variants   - Replace variant set
//! POST   /api/variants/{id}/stock      - Adjust stock by delta
//!
//! # Content
//! GET/POST          /api/banners, /api/branches, /api/shipping-methods
//! GET/PUT/DELETE    /api/banners/{id}, /api/branches/{id}, /api/shipping-methods/{id}
//!
//! # Records
//! GET    /api/applications             - List (status, q, page)
//! GET/PATCH/DELETE /api/applications/{id}
//! GET    /api/orders                   - List (status, q, page)
//! GET/PATCH /api/orders/{id}
//! POST   /api/orders/{id}/refunds      - Staff-initiated refund
//! GET    /api/refunds                  - List (status, page)
//! GET/PATCH /api/refunds/{id}          - Review, restock on approval
//!
//! # Admin users (super admin only)
//! GET    /api/admin-users
//! ```
//!
//! Reads need any admin; writes need `admin` or `super_admin`.

pub mod admin_users;
pub mod auth;
pub mod careers;
pub mod content;
pub mod dashboard;
pub mod orders;
pub mod products;
pub mod refunds;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Default rows per page on admin listings.
pub const DEFAULT_PER_PAGE: u32 = 25;
/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: u32 = 100;

/// Trimmed query text, `None` when blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/products/{id}/variants", put(products::replace_variants))
        .route("/variants/{id}/stock", post(products::adjust_stock))
}

fn content_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/banners",
            get(content::list_banners).post(content::create_banner),
        )
        .route(
            "/banners/{id}",
            get(content::get_banner)
                .put(content::update_banner)
                .delete(content::delete_banner),
        )
        .route(
            "/branches",
            get(content::list_branches).post(content::create_branch),
        )
        .route(
            "/branches/{id}",
            get(content::get_branch)
                .put(content::update_branch)
                .delete(content::delete_branch),
        )
        .route(
            "/shipping-methods",
            get(content::list_shipping_methods).post(content::create_shipping_method),
        )
        .route(
            "/shipping-methods/{id}",
            get(content::get_shipping_method)
                .put(content::update_shipping_method)
                .delete(content::delete_shipping_method),
        )
}

fn record_routes() -> Router<AppState> {
    Router::new()
        .route("/applications", get(careers::list))
        .route(
            "/applications/{id}",
            get(careers::get)
                .patch(careers::update_status)
                .delete(careers::delete),
        )
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::get).patch(orders::update))
        .route("/orders/{id}/refunds", post(orders::create_refund))
        .route("/refunds", get(refunds::list))
        .route("/refunds/{id}", get(refunds::get).patch(refunds::update))
}

/// Build the admin router (without health checks or middleware).
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .route("/dashboard", get(dashboard::summary))
        .route("/admin-users", get(admin_users::list))
        .merge(catalog_routes())
        .merge(content_routes())
        .merge(record_routes());

    Router::new()
        .nest("/auth", auth_routes())
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  lawn ".into())).as_deref(), Some("lawn"));
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(None), None);
    }
}
