//! Request bodies for admin writes and their validation.
//!
//! Each input deserializes from JSON (or YAML for the catalog seeder) and
//! `validate()`s into the record the repository writes. Validation never
//! touches the database.

pub mod catalog;
pub mod content;
pub mod records;

use serde::{Deserialize, Deserializer};
use thiserror::Error;
use url::Url;

pub use catalog::{
    NewProduct, NewVariant, ProductChanges, ProductInput, ProductPatch, VariantInput, slugify,
    validate_variants,
};
pub use content::{
    BannerInput, BranchInput, NewBanner, NewBranch, NewShippingMethod, ShippingMethodInput,
};
pub use records::{
    AdminRefundInput, ApplicationStatusInput, NewAdminRefund, OrderChanges, OrderPatch,
    RefundChanges, RefundPatch,
};

/// A request body failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Trimmed, non-empty text.
pub(crate) fn required(value: &str, field: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::new(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Trimmed text, `None` when blank.
pub(crate) fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// An absolute `http` or `https` URL.
pub(crate) fn http_url(value: &str, field: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    let ok = Url::parse(value)
        .is_ok_and(|url| matches!(url.scheme(), "http" | "https") && url.has_host());
    if !ok {
        return Err(ValidationError::new(format!(
            "{field} must be an http(s) URL"
        )));
    }
    Ok(value.to_string())
}

/// Distinguish an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub(crate) fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub(crate) const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_trims() {
        assert_eq!(required("  Lahore ", "city"), Ok("Lahore".to_string()));
        assert_eq!(
            required("   ", "city"),
            Err(ValidationError::new("city is required"))
        );
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("https://cdn.dukaan.pk/a.jpg", "image_url").is_ok());
        assert!(http_url("http://localhost:9000/a.jpg", "image_url").is_ok());
        assert!(http_url("ftp://cdn.dukaan.pk/a.jpg", "image_url").is_err());
        assert!(http_url("/images/a.jpg", "image_url").is_err());
        assert!(http_url("javascript:alert(1)", "image_url").is_err());
    }

    #[test]
    fn test_optional_blank_is_none() {
        assert_eq!(optional(Some("  ".into())), None);
        assert_eq!(optional(Some(" x ".into())), Some("x".into()));
        assert_eq!(optional(None), None);
    }
}
