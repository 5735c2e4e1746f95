//! Session-related types.
//!
//! Types stored in the session for authentication and the guest cart.

use serde::{Deserialize, Serialize};

use dukaan_core::{Email, UserId};

/// Session-stored customer identity.
///
/// Minimal data stored in the session to identify the logged-in customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Customer's database ID.
    pub id: UserId,
    /// Customer's email address.
    pub email: Email,
    /// Display name.
    pub name: String,
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the guest cart lines.
    pub const GUEST_CART: &str = "guest_cart";
}
