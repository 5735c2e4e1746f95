//! Catalog seeding from a YAML file.
//!
//! # Usage
//!
//! ```bash
//! dukaan seed catalog --file catalog.yaml
//! dukaan seed catalog --file catalog.yaml --clear
//! ```
//!
//! # File format
//!
//! Each section is optional and takes the same fields as the admin API's
//! create bodies:
//!
//! ```yaml
//! products:
//!   - name: Lawn Suit
//!     category: women
//!     base_price: 4500
//!     variants:
//!       - { sku: LS-S, label: Small, price: 4500, stock: 10 }
//! banners:
//!   - { title: Eid Sale, image_url: "https://cdn.example.pk/eid.jpg" }
//! branches:
//!   - { name: Gulberg, city: Lahore, address: "12 Main Blvd" }
//! shipping_methods:
//!   - { name: Standard, fee: 250, free_shipping_threshold: 5000 }
//! ```
//!
//! The whole file is validated before connecting to the database.

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use dukaan_admin::db::{
    BannerRepository, BranchRepository, ProductRepository, RepositoryError,
    ShippingMethodRepository, create_pool,
};
use dukaan_admin::input::{
    BannerInput, BranchInput, NewBanner, NewBranch, NewProduct, NewShippingMethod, ProductInput,
    ShippingMethodInput,
};

use super::{MissingEnvVar, database_url};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Catalog file has {} invalid entries:\n  {}", .0.len(), .0.join("\n  "))]
    Invalid(Vec<String>),

    #[error("Refusing to clear a catalog that has {0} orders")]
    HasOrders(i64),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// The YAML file as written.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogFile {
    #[serde(default)]
    pub products: Vec<ProductInput>,
    #[serde(default)]
    pub banners: Vec<BannerInput>,
    #[serde(default)]
    pub branches: Vec<BranchInput>,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethodInput>,
}

/// Every entry of a catalog file, validated.
#[derive(Debug, Default)]
pub struct CatalogSeed {
    pub products: Vec<NewProduct>,
    pub banners: Vec<NewBanner>,
    pub branches: Vec<NewBranch>,
    pub shipping_methods: Vec<NewShippingMethod>,
}

impl CatalogSeed {
    fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.banners.is_empty()
            && self.branches.is_empty()
            && self.shipping_methods.is_empty()
    }
}

fn validate_section<I, T, E>(
    section: &str,
    inputs: Vec<I>,
    validate: impl Fn(I) -> Result<T, E>,
    errors: &mut Vec<String>,
) -> Vec<T>
where
    E: std::fmt::Display,
{
    let mut valid = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        match validate(input) {
            Ok(value) => valid.push(value),
            Err(e) => errors.push(format!("{section}[{index}]: {e}")),
        }
    }
    valid
}

/// Validate every entry, reporting all failures at once.
///
/// Slugs and SKUs must also be unique within the file.
///
/// # Errors
///
/// Returns `SeedError::Invalid` listing each bad entry.
pub fn validate(file: CatalogFile) -> Result<CatalogSeed, SeedError> {
    let mut errors = Vec::new();

    let products = validate_section("products", file.products, ProductInput::validate, &mut errors);
    let banners = validate_section("banners", file.banners, BannerInput::validate, &mut errors);
    let branches = validate_section("branches", file.branches, BranchInput::validate, &mut errors);
    let shipping_methods = validate_section(
        "shipping_methods",
        file.shipping_methods,
        ShippingMethodInput::validate,
        &mut errors,
    );

    let mut slugs = HashSet::new();
    let mut skus = HashSet::new();
    for product in &products {
        if !slugs.insert(product.slug.as_str()) {
            errors.push(format!("products: duplicate slug '{}'", product.slug));
        }
        for variant in &product.variants {
            if !skus.insert(variant.sku.as_str()) {
                errors.push(format!("products: duplicate SKU '{}'", variant.sku));
            }
        }
    }

    if !errors.is_empty() {
        return Err(SeedError::Invalid(errors));
    }

    Ok(CatalogSeed {
        products,
        banners,
        branches,
        shipping_methods,
    })
}

/// Read and validate a catalog file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed or validated.
pub fn load(path: &Path) -> Result<CatalogSeed, SeedError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    validate(serde_yaml::from_str(&contents)?)
}

async fn clear(pool: &sqlx::PgPool) -> Result<(), SeedError> {
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.orders")
        .fetch_one(pool)
        .await?;
    if orders > 0 {
        return Err(SeedError::HasOrders(orders));
    }

    let mut tx = pool.begin().await?;
    for table in [
        "shop.product",
        "shop.banner",
        "shop.branch",
        "shop.shipping_method",
    ] {
        let deleted = sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tracing::info!(table, deleted, "Cleared");
    }
    tx.commit().await?;
    Ok(())
}

/// Seed the catalog from a YAML file.
///
/// With `clear`, existing products (and their variants), banners, branches
/// and shipping methods are deleted first. Clearing is refused once any
/// order exists.
///
/// # Errors
///
/// Returns an error if the file is invalid, the database is unreachable,
/// or an insert fails (for example a slug or SKU already in the database).
pub async fn catalog(path: &str, clear_existing: bool) -> Result<(), SeedError> {
    let seed = load(Path::new(path))?;
    if seed.is_empty() {
        tracing::warn!(path, "Catalog file has no entries");
        return Ok(());
    }

    let url = database_url()?;
    tracing::info!("Connecting to database...");
    let pool = create_pool(&url).await?;

    if clear_existing {
        clear(&pool).await?;
    }

    let products = ProductRepository::new(&pool);
    for product in &seed.products {
        products.create(product).await?;
    }

    let banners = BannerRepository::new(&pool);
    for banner in &seed.banners {
        banners.create(banner).await?;
    }

    let branches = BranchRepository::new(&pool);
    for branch in &seed.branches {
        branches.create(branch).await?;
    }

    let methods = ShippingMethodRepository::new(&pool);
    for method in &seed.shipping_methods {
        methods.create(method).await?;
    }

    tracing::info!(
        products = seed.products.len(),
        banners = seed.banners.len(),
        branches = seed.branches.len(),
        shipping_methods = seed.shipping_methods.len(),
        "Seeding complete"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    const CATALOG: &str = r#"
products:
  - name: Lawn Suit
    category: women
    base_price: 4500
    variants:
      - { sku: LS-S, label: Small, price: 4500, stock: 10 }
      - { sku: LS-M, label: Medium, price: "4500.00", stock: 3 }
banners:
  - { title: Eid Sale, image_url: "https://cdn.example.pk/eid.jpg", link_url: /sale }
branches:
  - { name: Gulberg, city: Lahore, address: "12 Main Blvd" }
shipping_methods:
  - { name: Standard, fee: 250, free_shipping_threshold: 5000 }
  - { name: Store pickup, kind: pickup, fee: 0 }
"#;

    fn parse(yaml: &str) -> Result<CatalogSeed, SeedError> {
        validate(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn test_valid_catalog() {
        let seed = parse(CATALOG).unwrap();
        assert_eq!(seed.products.len(), 1);
        assert_eq!(seed.products[0].slug, "lawn-suit");
        assert_eq!(seed.products[0].variants.len(), 2);
        assert_eq!(seed.products[0].variants[1].price, Decimal::new(4500, 0));
        assert_eq!(seed.banners.len(), 1);
        assert_eq!(seed.branches.len(), 1);
        assert_eq!(seed.shipping_methods.len(), 2);
        assert_eq!(
            seed.shipping_methods[1].kind,
            dukaan_core::ShippingKind::Pickup
        );
    }

    #[test]
    fn test_sections_are_optional() {
        let seed = parse("branches: []").unwrap();
        assert!(seed.is_empty());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(serde_yaml::from_str::<CatalogFile>("coupons: []").is_err());
    }

    #[test]
    fn test_reports_every_invalid_entry() {
        let yaml = r#"
products:
  - { name: " ", category: women, base_price: 100 }
  - { name: Kurta, category: men, base_price: -1 }
banners:
  - { title: Sale, image_url: "ftp://cdn.example.pk/x.jpg" }
"#;
        let Err(SeedError::Invalid(errors)) = parse(yaml) else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("products[0]:"));
        assert!(errors[1].starts_with("products[1]:"));
        assert!(errors[2].starts_with("banners[0]:"));
    }

    #[test]
    fn test_duplicate_slug_and_sku() {
        let yaml = r"
products:
  - name: Lawn Suit
    category: women
    base_price: 100
    variants: [{ sku: A-1, label: One, price: 100 }]
  - name: Lawn suit!
    category: women
    base_price: 100
    variants: [{ sku: A-1, label: One, price: 100 }]
";
        let Err(SeedError::Invalid(errors)) = parse(yaml) else {
            panic!("expected duplicate errors");
        };
        assert!(errors.contains(&"products: duplicate slug 'lawn-suit'".to_string()));
        assert!(errors.contains(&"products: duplicate SKU 'A-1'".to_string()));
    }
}
