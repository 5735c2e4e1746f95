//! Storefront content records: homepage banners and physical branches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BannerId, BranchId};

/// A homepage/hero banner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Banner {
    pub id: BannerId,
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    /// Sort order, ascending.
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A physical store that can serve as a pickup point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    pub pickup_enabled: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    /// Whether orders can be collected from this branch.
    #[must_use]
    pub const fn accepts_pickups(&self) -> bool {
        self.is_active && self.pickup_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickups_need_an_active_enabled_branch() {
        let now = Utc::now();
        let mut branch = Branch {
            id: BranchId::new(1),
            name: "Gulberg".to_owned(),
            city: "Lahore".to_owned(),
            address: "Main Boulevard".to_owned(),
            phone: None,
            opening_hours: None,
            pickup_enabled: true,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        assert!(branch.accepts_pickups());

        branch.pickup_enabled = false;
        assert!(!branch.accepts_pickups());

        branch.pickup_enabled = true;
        branch.is_active = false;
        assert!(!branch.accepts_pickups());
    }
}
