//! Product and variant inputs.

use rust_decimal::Decimal;
use serde::Deserialize;

use dukaan_core::VariantId;

use super::{ValidationError, default_true, double_option, http_url, optional, required};

/// Turn a name into a URL slug: lowercase ASCII letters and digits joined
/// by single hyphens. Other characters act as separators.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

fn slug_for(explicit: Option<&str>, name: &str) -> Result<String, ValidationError> {
    let slug = slugify(explicit.unwrap_or(name));
    if slug.is_empty() {
        return Err(ValidationError::new(
            "slug must contain at least one letter or digit",
        ));
    }
    Ok(slug)
}

fn non_negative(value: Decimal, field: &str) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::new(format!("{field} must be >= 0")));
    }
    Ok(value)
}

fn image_urls(images: Vec<String>) -> Result<Vec<String>, ValidationError> {
    images
        .iter()
        .map(|image| http_url(image, "images"))
        .collect()
}

/// Body for creating a product, optionally with variants.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    /// Generated from `name` when absent.
    pub slug: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    pub brand: Option<String>,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub variants: Vec<VariantInput>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub slug: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub brand: Option<String>,
    pub base_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub variants: Vec<NewVariant>,
}

impl ProductInput {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let name = required(&self.name, "name")?;
        let slug = slug_for(optional(self.slug).as_deref(), &name)?;
        let category = required(&self.category, "category")?;
        let base_price = non_negative(self.base_price, "base_price")?;
        let compare_at_price = self
            .compare_at_price
            .map(|p| non_negative(p, "compare_at_price"))
            .transpose()?;
        let images = image_urls(self.images)?;
        let variants = validate_variants(self.variants)?;

        Ok(NewProduct {
            slug,
            name,
            description: self.description.trim().to_string(),
            category,
            brand: optional(self.brand),
            base_price,
            compare_at_price,
            images,
            is_active: self.is_active,
            is_featured: self.is_featured,
            variants,
        })
    }
}

/// One variant in a create or replace request.
#[derive(Debug, Clone, Deserialize)]
pub struct VariantInput {
    /// Existing variant to update when replacing; new variant when absent.
    pub id: Option<VariantId>,
    pub sku: String,
    pub label: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub images: Vec<String>,
    /// Defaults to the variant's index in the list.
    pub position: Option<i32>,
}

/// A validated variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    pub id: Option<VariantId>,
    pub sku: String,
    pub label: String,
    pub price: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub stock: i32,
    pub images: Vec<String>,
    pub position: i32,
}

impl VariantInput {
    fn validate(self, index: usize) -> Result<NewVariant, ValidationError> {
        let sku = required(&self.sku, "variant sku")?;
        let label = required(&self.label, "variant label")?;
        let price = non_negative(self.price, "variant price")?;
        let compare_at_price = self
            .compare_at_price
            .map(|p| non_negative(p, "variant compare_at_price"))
            .transpose()?;
        if self.stock < 0 {
            return Err(ValidationError::new(format!(
                "stock for variant {sku} must be >= 0"
            )));
        }
        let images = image_urls(self.images)?;
        let position = self
            .position
            .unwrap_or_else(|| i32::try_from(index).unwrap_or(i32::MAX));

        Ok(NewVariant {
            id: self.id,
            sku,
            label,
            price,
            compare_at_price,
            stock: self.stock,
            images,
            position,
        })
    }
}

/// Validate a variant list. SKU uniqueness is left to the database so a
/// clash inside one request reports the same 409 as a clash with another
/// product.
///
/// # Errors
///
/// Returns the first variant field that fails validation, or a duplicate
/// variant id.
pub fn validate_variants(variants: Vec<VariantInput>) -> Result<Vec<NewVariant>, ValidationError> {
    let validated = variants
        .into_iter()
        .enumerate()
        .map(|(index, variant)| variant.validate(index))
        .collect::<Result<Vec<_>, _>>()?;

    for (index, variant) in validated.iter().enumerate() {
        if let Some(id) = variant.id
            && validated.iter().take(index).any(|earlier| earlier.id == Some(id))
        {
            return Err(ValidationError::new(format!(
                "variant {id} is listed more than once"
            )));
        }
    }
    Ok(validated)
}

/// Partial product update. Absent fields are left unchanged; `brand` and
/// `compare_at_price` may be cleared with `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub brand: Option<Option<String>>,
    pub base_price: Option<Decimal>,
    #[serde(default, deserialize_with = "double_option")]
    pub compare_at_price: Option<Option<Decimal>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

/// A validated partial update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub slug: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<Option<String>>,
    pub base_price: Option<Decimal>,
    pub compare_at_price: Option<Option<Decimal>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

impl ProductChanges {
    /// Whether the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl ProductPatch {
    /// # Errors
    ///
    /// Returns the first field that fails validation.
    pub fn validate(self) -> Result<ProductChanges, ValidationError> {
        let name = self.name.as_deref().map(|n| required(n, "name")).transpose()?;
        let slug = self
            .slug
            .as_deref()
            .map(|s| slug_for(Some(s), ""))
            .transpose()?;
        let category = self
            .category
            .as_deref()
            .map(|c| required(c, "category"))
            .transpose()?;
        let base_price = self
            .base_price
            .map(|p| non_negative(p, "base_price"))
            .transpose()?;
        let compare_at_price = match self.compare_at_price {
            Some(Some(p)) => Some(Some(non_negative(p, "compare_at_price")?)),
            other => other,
        };
        let images = self.images.map(image_urls).transpose()?;

        Ok(ProductChanges {
            slug,
            name,
            description: self.description.map(|d| d.trim().to_string()),
            category,
            brand: self.brand.map(optional),
            base_price,
            compare_at_price,
            images,
            is_active: self.is_active,
            is_featured: self.is_featured,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn product(value: serde_json::Value) -> ProductInput {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Lawn Kurta - Mint Green"), "lawn-kurta-mint-green");
        assert_eq!(slugify("  3-Piece  Suit!! "), "3-piece-suit");
        assert_eq!(slugify("Ēid Édition"), "id-dition");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn test_slug_generated_from_name() {
        let new = product(json!({
            "name": " Khaddar Shawl ",
            "category": "Shawls",
            "base_price": "4500"
        }))
        .validate()
        .unwrap();
        assert_eq!(new.slug, "khaddar-shawl");
        assert_eq!(new.name, "Khaddar Shawl");
        assert!(new.is_active);
        assert!(!new.is_featured);
    }

    #[test]
    fn test_explicit_slug_is_normalized() {
        let new = product(json!({
            "slug": "Winter Shawl 2026",
            "name": "Shawl",
            "category": "Shawls",
            "base_price": "4500"
        }))
        .validate()
        .unwrap();
        assert_eq!(new.slug, "winter-shawl-2026");
    }

    #[test]
    fn test_product_rejections() {
        let base = json!({ "name": "Shawl", "category": "Shawls", "base_price": "10" });

        let mut no_name = base.clone();
        no_name["name"] = json!("  ");
        assert!(product(no_name).validate().is_err());

        let mut negative = base.clone();
        negative["base_price"] = json!("-1");
        assert!(product(negative).validate().is_err());

        let mut bad_image = base.clone();
        bad_image["images"] = json!(["/local.png"]);
        assert!(product(bad_image).validate().is_err());

        let mut bad_stock = base;
        bad_stock["variants"] = json!([{ "sku": "S-1", "label": "M", "price": "10", "stock": -2 }]);
        assert!(product(bad_stock).validate().is_err());
    }

    #[test]
    fn test_variant_positions_default_to_index() {
        let new = product(json!({
            "name": "Kurta",
            "category": "Kurtas",
            "base_price": "2500",
            "variants": [
                { "sku": "K-S", "label": "S", "price": "2500" },
                { "sku": "K-M", "label": "M", "price": "2500", "position": 7 },
                { "sku": "K-L", "label": "L", "price": "2700", "stock": 3 }
            ]
        }))
        .validate()
        .unwrap();
        let positions: Vec<i32> = new.variants.iter().map(|v| v.position).collect();
        assert_eq!(positions, vec![0, 7, 2]);
        assert_eq!(new.variants.last().unwrap().stock, 3);
    }

    #[test]
    fn test_duplicate_variant_ids_rejected() {
        let variants: Vec<VariantInput> = serde_json::from_value(json!([
            { "id": 4, "sku": "A", "label": "S", "price": "1" },
            { "id": 4, "sku": "B", "label": "M", "price": "1" }
        ]))
        .unwrap();
        assert!(validate_variants(variants).is_err());
    }

    #[test]
    fn test_patch_distinguishes_null_from_absent() {
        let patch: ProductPatch = serde_json::from_value(json!({ "brand": null })).unwrap();
        let changes = patch.validate().unwrap();
        assert_eq!(changes.brand, Some(None));
        assert_eq!(changes.compare_at_price, None);

        let empty: ProductPatch = serde_json::from_value(json!({})).unwrap();
        assert!(empty.validate().unwrap().is_empty());
    }

    #[test]
    fn test_patch_validates_present_fields() {
        let patch: ProductPatch =
            serde_json::from_value(json!({ "name": "", "base_price": "5" })).unwrap();
        assert!(patch.validate().is_err());

        let patch: ProductPatch =
            serde_json::from_value(json!({ "slug": "New Slug", "compare_at_price": "9" })).unwrap();
        let changes = patch.validate().unwrap();
        assert_eq!(changes.slug.as_deref(), Some("new-slug"));
        assert_eq!(changes.compare_at_price, Some(Some(Decimal::new(9, 0))));
    }
}
