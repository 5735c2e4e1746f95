//! Customer account records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use dukaan_core::{Email, UserId};

/// A registered storefront customer.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: UserId,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
