//! Product and variant management.

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use dukaan_core::{PageRequest, Product, ProductDetail, ProductId, Variant, VariantId};

use super::{RepositoryError, conflict_on_unique, like_pattern};
use crate::input::{NewProduct, NewVariant, ProductChanges};

const PRODUCT_COLUMNS: &str = "id, slug, name, description, category, brand, base_price, \
     compare_at_price, images, is_active, is_featured, created_at, updated_at";

const PRODUCT_COLUMNS_ALIASED: &str = "p.id, p.slug, p.name, p.description, p.category, \
     p.brand, p.base_price, p.compare_at_price, p.images, p.is_active, p.is_featured, \
     p.created_at, p.updated_at";

const VARIANT_COLUMNS: &str =
    "id, product_id, sku, label, price, compare_at_price, stock, images, position";

/// Filters for the admin product listing. Inactive products are included
/// unless `active` says otherwise.
#[derive(Debug, Clone, Default)]
pub struct AdminProductFilter {
    /// Matches name, slug or any variant SKU.
    pub q: Option<String>,
    pub category: Option<String>,
    pub active: Option<bool>,
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &AdminProductFilter) {
    query.push(" WHERE TRUE");
    if let Some(q) = filter.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        query
            .push(" AND (p.name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR p.slug ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM shop.variant v WHERE v.product_id = p.id AND v.sku ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
    if let Some(category) = filter.category.as_deref() {
        query.push(" AND p.category = ").push_bind(category.to_string());
    }
    if let Some(active) = filter.active {
        query.push(" AND p.is_active = ").push_bind(active);
    }
}

async fn insert_variant(
    conn: &mut PgConnection,
    product_id: ProductId,
    variant: &NewVariant,
) -> Result<Variant, RepositoryError> {
    sqlx::query_as::<_, Variant>(&format!(
        r"
        INSERT INTO shop.variant
            (product_id, sku, label, price, compare_at_price, stock, images, position)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING {VARIANT_COLUMNS}
        "
    ))
    .bind(product_id)
    .bind(&variant.sku)
    .bind(&variant.label)
    .bind(variant.price)
    .bind(variant.compare_at_price)
    .bind(variant.stock)
    .bind(&variant.images)
    .bind(variant.position)
    .fetch_one(conn)
    .await
    .map_err(|e| conflict_on_unique(e, &format!("variant SKU {}", variant.sku)))
}

async fn variants_of(
    conn: &mut PgConnection,
    product_id: ProductId,
) -> Result<Vec<Variant>, RepositoryError> {
    Ok(sqlx::query_as::<_, Variant>(&format!(
        "SELECT {VARIANT_COLUMNS} FROM shop.variant WHERE product_id = $1 ORDER BY position, id"
    ))
    .bind(product_id)
    .fetch_all(conn)
    .await?)
}

/// Repository for catalog writes.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products, newest first, with the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &AdminProductFilter,
        page: PageRequest,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.product p");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS_ALIASED} FROM shop.product p"
        ));
        push_filters(&mut query, filter);
        query.push(" ORDER BY p.created_at DESC, p.id DESC");
        query.push(" LIMIT ").push_bind(page.limit());
        query.push(" OFFSET ").push_bind(page.offset());

        let items = query.build_query_as::<Product>().fetch_all(self.pool).await?;
        Ok((items, total))
    }

    /// Get a product with its variants, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(product) = product else {
            return Ok(None);
        };
        let variants = variants_of(&mut conn, id).await?;
        Ok(Some(ProductDetail { product, variants }))
    }

    /// Insert a product and its variants in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` for a taken slug or SKU.
    pub async fn create(&self, new: &NewProduct) -> Result<ProductDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO shop.product
                (slug, name, description, category, brand, base_price, compare_at_price,
                 images, is_active, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&new.slug)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.category)
        .bind(&new.brand)
        .bind(new.base_price)
        .bind(new.compare_at_price)
        .bind(&new.images)
        .bind(new.is_active)
        .bind(new.is_featured)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, &format!("product slug {}", new.slug)))?;

        let mut variants = Vec::with_capacity(new.variants.len());
        for variant in &new.variants {
            variants.push(insert_variant(&mut tx, product.id, variant).await?);
        }

        tx.commit().await?;
        Ok(ProductDetail { product, variants })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product and
    /// `RepositoryError::Conflict` for a taken slug.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<ProductDetail, RepositoryError> {
        if !changes.is_empty() {
            let mut query = QueryBuilder::<Postgres>::new("UPDATE shop.product SET ");
            let mut set = query.separated(", ");
            if let Some(slug) = &changes.slug {
                set.push("slug = ").push_bind_unseparated(slug.clone());
            }
            if let Some(name) = &changes.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(description) = &changes.description {
                set.push("description = ")
                    .push_bind_unseparated(description.clone());
            }
            if let Some(category) = &changes.category {
                set.push("category = ").push_bind_unseparated(category.clone());
            }
            if let Some(brand) = &changes.brand {
                set.push("brand = ").push_bind_unseparated(brand.clone());
            }
            if let Some(price) = changes.base_price {
                set.push("base_price = ").push_bind_unseparated(price);
            }
            if let Some(price) = changes.compare_at_price {
                set.push("compare_at_price = ").push_bind_unseparated(price);
            }
            if let Some(images) = &changes.images {
                set.push("images = ").push_bind_unseparated(images.clone());
            }
            if let Some(active) = changes.is_active {
                set.push("is_active = ").push_bind_unseparated(active);
            }
            if let Some(featured) = changes.is_featured {
                set.push("is_featured = ").push_bind_unseparated(featured);
            }
            set.push("updated_at = NOW()");
            query.push(" WHERE id = ").push_bind(id);

            let result = query
                .build()
                .execute(self.pool)
                .await
                .map_err(|e| conflict_on_unique(e, "product slug"))?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::NotFound);
            }
        }

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Delete a product; its variants go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Make the product's variants exactly `variants`.
    ///
    /// Entries with an id update that variant, entries without one are
    /// inserted, and variants not listed are deleted. All in one
    /// transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown product,
    /// `RepositoryError::Invalid` when an id belongs to another product, and
    /// `RepositoryError::Conflict` for a taken SKU.
    pub async fn replace_variants(
        &self,
        id: ProductId,
        variants: &[NewVariant],
    ) -> Result<ProductDetail, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<ProductId> =
            sqlx::query_scalar("SELECT id FROM shop.product WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let kept: Vec<i32> = variants
            .iter()
            .filter_map(|v| v.id.map(|id| id.as_i32()))
            .collect();
        sqlx::query("DELETE FROM shop.variant WHERE product_id = $1 AND NOT (id = ANY($2))")
            .bind(id)
            .bind(&kept)
            .execute(&mut *tx)
            .await?;

        for variant in variants {
            let Some(variant_id) = variant.id else {
                insert_variant(&mut tx, id, variant).await?;
                continue;
            };
            let result = sqlx::query(
                r"
                UPDATE shop.variant
                SET sku = $3, label = $4, price = $5, compare_at_price = $6, stock = $7,
                    images = $8, position = $9
                WHERE id = $1 AND product_id = $2
                ",
            )
            .bind(variant_id)
            .bind(id)
            .bind(&variant.sku)
            .bind(&variant.label)
            .bind(variant.price)
            .bind(variant.compare_at_price)
            .bind(variant.stock)
            .bind(&variant.images)
            .bind(variant.position)
            .execute(&mut *tx)
            .await
            .map_err(|e| conflict_on_unique(e, &format!("variant SKU {}", variant.sku)))?;
            if result.rows_affected() == 0 {
                return Err(RepositoryError::Invalid(format!(
                    "variant {variant_id} does not belong to product {id}"
                )));
            }
        }

        sqlx::query("UPDATE shop.product SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM shop.product WHERE id = $1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        let variants = variants_of(&mut tx, id).await?;

        tx.commit().await?;
        Ok(ProductDetail { product, variants })
    }

    /// Add `delta` (possibly negative) to a variant's stock.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` for an unknown variant and
    /// `RepositoryError::Invalid` if the stock would drop below zero.
    pub async fn adjust_stock(
        &self,
        variant_id: VariantId,
        delta: i32,
    ) -> Result<Variant, RepositoryError> {
        let updated = sqlx::query_as::<_, Variant>(&format!(
            r"
            UPDATE shop.variant SET stock = stock + $2
            WHERE id = $1 AND stock + $2 >= 0
            RETURNING {VARIANT_COLUMNS}
            "
        ))
        .bind(variant_id)
        .bind(delta)
        .fetch_optional(self.pool)
        .await?;

        if let Some(variant) = updated {
            return Ok(variant);
        }

        let stock: Option<i32> = sqlx::query_scalar("SELECT stock FROM shop.variant WHERE id = $1")
            .bind(variant_id)
            .fetch_optional(self.pool)
            .await?;
        match stock {
            Some(stock) => Err(RepositoryError::Invalid(format!(
                "stock cannot go below zero (current stock {stock}, delta {delta})"
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }
}
