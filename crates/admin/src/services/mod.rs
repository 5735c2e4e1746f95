//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email and password login, admin account creation

pub mod auth;

pub use auth::{AdminAuthError, AdminAuthService};
