//! Storefront-only models.
//!
//! Shared records (products, orders, refunds...) live in `dukaan-core`; the
//! types here only make sense inside the storefront binary.

pub mod customer;
pub mod session;

pub use customer::Customer;
pub use session::{CurrentUser, keys as session_keys};
