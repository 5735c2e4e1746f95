//! Catalog queries: product listing, product detail, categories and the
//! variant lookups the cart and checkout need.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use dukaan_core::{PageRequest, Product, ProductDetail, ProductId, Variant, VariantId};

use super::RepositoryError;

/// Sort order for the product listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    Name,
}

impl ProductSort {
    const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY p.created_at DESC, p.id DESC",
            Self::PriceAsc => " ORDER BY min_price ASC, p.id ASC",
            Self::PriceDesc => " ORDER BY min_price DESC, p.id ASC",
            Self::Name => " ORDER BY p.name ASC, p.id ASC",
        }
    }
}

impl std::str::FromStr for ProductSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "newest" => Ok(Self::Newest),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name" => Ok(Self::Name),
            other => Err(format!(
                "invalid sort '{other}': expected newest, price_asc, price_desc or name"
            )),
        }
    }
}

/// Filters for the public product listing. Only active products are listed.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub q: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

/// A listing row: the product plus aggregates over its variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ProductSummary {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub min_price: Decimal,
    pub max_price: Decimal,
    pub compare_at_price: Option<Decimal>,
    #[serde(skip)]
    pub images: Vec<String>,
    pub is_featured: bool,
    pub total_stock: i64,
}

impl ProductSummary {
    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.total_stock > 0
    }
}

/// Category name with the number of active products in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CategoryCount {
    pub category: String,
    pub product_count: i64,
}

/// A variant joined with the product fields the cart shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartVariant {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_slug: String,
    pub product_name: String,
    pub product_active: bool,
    pub sku: String,
    pub label: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

const SUMMARY_SELECT: &str = r"
    SELECT p.id, p.slug, p.name, p.category, p.brand,
           COALESCE(v.min_price, p.base_price) AS min_price,
           COALESCE(v.max_price, p.base_price) AS max_price,
           p.compare_at_price, p.images, p.is_featured,
           COALESCE(v.total_stock, 0) AS total_stock
    FROM shop.product p
    LEFT JOIN (
        SELECT product_id, MIN(price) AS min_price, MAX(price) AS max_price,
               SUM(stock)::BIGINT AS total_stock
        FROM shop.variant
        GROUP BY product_id
    ) v ON v.product_id = p.id
    WHERE p.is_active";

const CART_VARIANT_SELECT: &str = r"
    SELECT v.id AS variant_id, p.id AS product_id, p.slug AS product_slug,
           p.name AS product_name, p.is_active AS product_active,
           v.sku, v.label, v.price, v.stock,
           COALESCE(v.images[1], p.images[1]) AS image
    FROM shop.variant v
    JOIN shop.product p ON p.id = v.product_id";

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List active products matching `filter`, returning the page and the
    /// total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<ProductSummary>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM (");
        count.push(SUMMARY_SELECT);
        push_filters(&mut count, filter);
        count.push(") matches");
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        push_filters(&mut query, filter);
        query.push(filter.sort.order_by());
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let items = query
            .build_query_as::<ProductSummary>()
            .fetch_all(self.pool)
            .await?;

        Ok((items, total))
    }

    /// Get an active product with its variants ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_active_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<ProductDetail>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(
            r"
            SELECT id, slug, name, description, category, brand, base_price,
                   compare_at_price, images, is_active, is_featured,
                   created_at, updated_at
            FROM shop.product
            WHERE slug = $1 AND is_active
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        let variants = self.variants_for(product.id).await?;
        Ok(Some(ProductDetail { product, variants }))
    }

    /// Variants of a product ordered by position.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn variants_for(&self, product_id: ProductId) -> Result<Vec<Variant>, RepositoryError> {
        let variants = sqlx::query_as::<_, Variant>(
            r"
            SELECT id, product_id, sku, label, price, compare_at_price, stock,
                   images, position
            FROM shop.variant
            WHERE product_id = $1
            ORDER BY position, id
            ",
        )
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;

        Ok(variants)
    }

    /// Distinct categories of active products with counts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<CategoryCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryCount>(
            r"
            SELECT category, COUNT(*) AS product_count
            FROM shop.product
            WHERE is_active
            GROUP BY category
            ORDER BY category
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Look up one variant with its product fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_variant(&self, id: VariantId) -> Result<Option<CartVariant>, RepositoryError> {
        let row = sqlx::query_as::<_, CartVariant>(&format!("{CART_VARIANT_SELECT} WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row)
    }

    /// Look up several variants at once. Unknown ids are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn cart_variants(
        &self,
        ids: &[VariantId],
    ) -> Result<Vec<CartVariant>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let raw: Vec<i32> = ids.iter().map(VariantId::as_i32).collect();
        let rows = sqlx::query_as::<_, CartVariant>(&format!(
            "{CART_VARIANT_SELECT} WHERE v.id = ANY($1)"
        ))
        .bind(raw)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = format!("%{}%", escape_like(q));
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(category) = filter.category.as_deref().filter(|c| !c.is_empty()) {
        query
            .push(" AND LOWER(p.category) = LOWER(")
            .push_bind(category.to_owned())
            .push(")");
    }
    if let Some(featured) = filter.featured {
        query.push(" AND p.is_featured = ").push_bind(featured);
    }
    if let Some(min) = filter.min_price {
        query
            .push(" AND COALESCE(v.min_price, p.base_price) >= ")
            .push_bind(min);
    }
    if let Some(max) = filter.max_price {
        query
            .push(" AND COALESCE(v.min_price, p.base_price) <= ")
            .push_bind(max);
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parses_known_values() {
        assert_eq!("newest".parse::<ProductSort>().unwrap(), ProductSort::Newest);
        assert_eq!("price_desc".parse::<ProductSort>().unwrap(), ProductSort::PriceDesc);
        assert!("cheapest".parse::<ProductSort>().is_err());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("kurta"), "kurta");
    }

    #[test]
    fn test_filters_render_in_order() {
        let filter = ProductFilter {
            q: Some("lawn".into()),
            category: Some("Women".into()),
            featured: Some(true),
            min_price: Some(Decimal::new(1000, 0)),
            max_price: None,
            sort: ProductSort::PriceAsc,
        };
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        push_filters(&mut query, &filter);
        let sql = query.sql();
        assert!(sql.contains("p.name ILIKE $1 OR p.description ILIKE $2"));
        assert!(sql.contains("LOWER(p.category) = LOWER($3)"));
        assert!(sql.contains("p.is_featured = $4"));
        assert!(sql.contains(">= $5"));
        assert!(!sql.contains("<="));
    }
}
