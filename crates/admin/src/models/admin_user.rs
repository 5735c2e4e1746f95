//! Admin user domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dukaan_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use dukaan_core::AdminRole;

/// An admin user (domain type). The password hash never leaves the
/// repository.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
