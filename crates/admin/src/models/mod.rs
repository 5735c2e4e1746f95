//! Domain models for admin.

pub mod admin_user;
pub mod session;

pub use admin_user::{AdminRole, AdminUser};
pub use session::CurrentAdmin;
pub use session::keys as session_keys;
