//! HTTP route handlers for the storefront JSON API.
//!
//! # Route Structure
//!
//! ```text
//! # Catalog
//! GET    /api/products                    - Active products (filters, sort, pagination)
//! GET    /api/products/{slug}             - Product detail with variants
//! GET    /api/categories                  - Categories with product counts
//!
//! # Content
//! GET    /api/banners                     - Live banners
//! GET    /api/branches                    - Active branches (?city=)
//! GET    /api/shipping-methods            - Active shipping methods
//!
//! # Cart (guest session or customer)
//! GET    /api/cart                        - Cart view
//! PUT    /api/cart                        - Replace all lines
//! DELETE /api/cart                        - Clear the cart
//! POST   /api/cart/items                  - Add a variant
//! PATCH  /api/cart/items/{variant_id}     - Set a line quantity
//! DELETE /api/cart/items/{variant_id}     - Remove a line
//!
//! # Checkout
//! POST   /api/checkout/quote              - Subtotal, shipping fee and total
//! POST   /api/checkout                    - Place the order
//!
//! # Orders
//! GET    /api/orders                      - Order history (requires auth)
//! GET    /api/orders/track                - Guest lookup (?order_number=&email=)
//!
//! # Refunds and careers
//! POST   /api/refunds                     - Request a refund
//! POST   /api/careers/applications        - Submit a job application
//!
//! # Auth (rate limited)
//! POST   /api/auth/register               - Create an account and log in
//! POST   /api/auth/login                  - Log in, merging the guest cart
//! POST   /api/auth/logout                 - Log out
//! GET    /api/auth/me                     - Current customer
//!
//! # Assistant (rate limited)
//! GET    /api/assistant/tools             - Tool registry
//! POST   /api/assistant/tools/{name}      - Run one tool
//! POST   /api/assistant/ask               - Scripted assistant turn
//! GET    /api/assistant/search            - Knowledge search (?q=&top_k=)
//! ```

pub mod assistant;
pub mod auth;
pub mod careers;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod orders;
pub mod refunds;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter};
use crate::state::AppState;

/// Create the catalog and content routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::show_product))
        .route("/categories", get(catalog::categories))
        .route("/banners", get(content::banners))
        .route("/branches", get(content::branches))
        .route("/shipping-methods", get(content::shipping_methods))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).put(cart::replace).delete(cart::clear))
        .route("/items", post(cart::add))
        .route(
            "/items/{variant_id}",
            patch(cart::update).delete(cart::remove),
        )
}

/// Create the checkout, order, refund and careers routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/checkout/quote", post(checkout::quote))
        .route("/checkout", post(checkout::place_order))
        .route("/orders", get(orders::list))
        .route("/orders/track", get(orders::track))
        .route("/refunds", post(refunds::create))
        .route("/careers/applications", post(careers::apply))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .layer(auth_rate_limiter())
}

/// Create the assistant routes router.
pub fn assistant_routes() -> Router<AppState> {
    Router::new()
        .route("/tools", get(assistant::list_tools))
        .route("/tools/{name}", post(assistant::call_tool))
        .route("/ask", post(assistant::ask))
        .route("/search", get(assistant::search))
        .layer(api_rate_limiter())
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(order_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
        .nest("/assistant", assistant_routes());

    Router::new().nest("/api", api)
}
