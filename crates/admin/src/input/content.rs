//! Banner, branch and shipping method inputs.
//!
//! Updates replace every field, so create and update share one input.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use dukaan_core::ShippingKind;

use super::{ValidationError, default_true, http_url, optional, required};

/// Body for creating or replacing a banner.
#[derive(Debug, Clone, Deserialize)]
pub struct BannerInput {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    /// Absolute http(s) URL or a site path starting with `/`.
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBanner {
    pub title: String,
    pub subtitle: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl BannerInput {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<NewBanner, ValidationError> {
        let title = required(&self.title, "title")?;
        let image_url = http_url(&self.image_url, "image_url")?;
        let link_url = optional(self.link_url)
            .map(|link| {
                if link.starts_with('/') && !link.starts_with("//") {
                    Ok(link)
                } else {
                    http_url(&link, "link_url")
                }
            })
            .transpose()?;
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at)
            && end <= start
        {
            return Err(ValidationError::new("ends_at must be after starts_at"));
        }

        Ok(NewBanner {
            title,
            subtitle: optional(self.subtitle),
            image_url,
            link_url,
            position: self.position,
            is_active: self.is_active,
            starts_at: self.starts_at,
            ends_at: self.ends_at,
        })
    }
}

/// Body for creating or replacing a branch.
#[derive(Debug, Clone, Deserialize)]
pub struct BranchInput {
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    #[serde(default = "default_true")]
    pub pickup_enabled: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBranch {
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone: Option<String>,
    pub opening_hours: Option<String>,
    pub pickup_enabled: bool,
    pub is_active: bool,
}

impl BranchInput {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<NewBranch, ValidationError> {
        Ok(NewBranch {
            name: required(&self.name, "name")?,
            city: required(&self.city, "city")?,
            address: required(&self.address, "address")?,
            phone: optional(self.phone),
            opening_hours: optional(self.opening_hours),
            pickup_enabled: self.pickup_enabled,
            is_active: self.is_active,
        })
    }
}

/// Body for creating or replacing a shipping method.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingMethodInput {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ShippingKind,
    pub fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub estimated_days_min: Option<i32>,
    pub estimated_days_max: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewShippingMethod {
    pub name: String,
    pub description: Option<String>,
    pub kind: ShippingKind,
    pub fee: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub estimated_days_min: Option<i32>,
    pub estimated_days_max: Option<i32>,
    pub is_active: bool,
    pub position: i32,
}

impl ShippingMethodInput {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<NewShippingMethod, ValidationError> {
        let name = required(&self.name, "name")?;
        if self.fee < Decimal::ZERO {
            return Err(ValidationError::new("fee must be >= 0"));
        }
        if self.free_shipping_threshold.is_some_and(|t| t < Decimal::ZERO) {
            return Err(ValidationError::new("free_shipping_threshold must be >= 0"));
        }
        if self.estimated_days_min.is_some_and(|d| d < 0)
            || self.estimated_days_max.is_some_and(|d| d < 0)
        {
            return Err(ValidationError::new("estimated days must be >= 0"));
        }
        if let (Some(min), Some(max)) = (self.estimated_days_min, self.estimated_days_max)
            && min > max
        {
            return Err(ValidationError::new(
                "estimated_days_min must be <= estimated_days_max",
            ));
        }

        Ok(NewShippingMethod {
            name,
            description: optional(self.description),
            kind: self.kind,
            fee: self.fee,
            free_shipping_threshold: self.free_shipping_threshold,
            estimated_days_min: self.estimated_days_min,
            estimated_days_max: self.estimated_days_max,
            is_active: self.is_active,
            position: self.position,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn shipping(value: serde_json::Value) -> Result<NewShippingMethod, ValidationError> {
        serde_json::from_value::<ShippingMethodInput>(value)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_banner_urls() {
        let banner = |image: &str, link: Option<&str>| {
            serde_json::from_value::<BannerInput>(json!({
                "title": "Eid Sale",
                "image_url": image,
                "link_url": link,
            }))
            .unwrap()
            .validate()
        };
        assert!(banner("https://cdn.dukaan.pk/eid.jpg", Some("/products?category=eid")).is_ok());
        assert!(banner("https://cdn.dukaan.pk/eid.jpg", Some("https://dukaan.pk/sale")).is_ok());
        assert!(banner("cdn.dukaan.pk/eid.jpg", None).is_err());
        assert!(banner("https://cdn.dukaan.pk/eid.jpg", Some("//evil.example")).is_err());
    }

    #[test]
    fn test_banner_window_order() {
        let input: BannerInput = serde_json::from_value(json!({
            "title": "Eid Sale",
            "image_url": "https://cdn.dukaan.pk/eid.jpg",
            "starts_at": "2026-04-01T00:00:00Z",
            "ends_at": "2026-03-01T00:00:00Z",
        }))
        .unwrap();
        assert_eq!(
            input.validate(),
            Err(ValidationError::new("ends_at must be after starts_at"))
        );
    }

    #[test]
    fn test_branch_defaults() {
        let branch: BranchInput = serde_json::from_value(json!({
            "name": "Gulberg",
            "city": "Lahore",
            "address": "Main Boulevard",
            "phone": "  ",
        }))
        .unwrap();
        let branch = branch.validate().unwrap();
        assert!(branch.pickup_enabled);
        assert!(branch.is_active);
        assert_eq!(branch.phone, None);
    }

    #[test]
    fn test_shipping_rules() {
        assert!(shipping(json!({ "name": "Standard", "fee": "250" })).is_ok());
        assert!(shipping(json!({ "name": "Standard", "fee": "-1" })).is_err());
        assert!(
            shipping(json!({ "name": "Standard", "fee": "250", "free_shipping_threshold": "-5" }))
                .is_err()
        );
        assert!(
            shipping(json!({
                "name": "Standard",
                "fee": "250",
                "estimated_days_min": 5,
                "estimated_days_max": 2
            }))
            .is_err()
        );
        let pickup = shipping(json!({ "name": "Store pickup", "fee": "0", "kind": "pickup" })).unwrap();
        assert_eq!(pickup.kind, ShippingKind::Pickup);
    }
}
