//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID
//! 4. Security headers (adds HSTS on top of the storefront set)
//! 5. Session layer (`admin.session`, SameSite=Strict)
//!
//! Authorization is per handler through the [`RequireAdmin`],
//! [`RequireWriter`] and [`RequireSuperAdmin`] extractors.

pub mod auth;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{
    AdminAuthRejection, RequireAdmin, RequireSuperAdmin, RequireWriter, clear_current_admin,
    set_current_admin,
};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::{create_session_layer, session_layer, session_store};
