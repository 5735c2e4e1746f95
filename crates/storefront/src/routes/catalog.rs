//! Catalog routes: product listing, product detail, categories.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use dukaan_core::{Page, PageRequest, ProductDetail, ProductId};

use crate::db::CatalogRepository;
use crate::db::catalog::{CategoryCount, ProductFilter, ProductSort, ProductSummary};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Default products per page.
pub const DEFAULT_PER_PAGE: u32 = 12;
/// Largest page size a client may ask for.
pub const MAX_PER_PAGE: u32 = 48;

/// Query string for `GET /api/products`.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub featured: Option<bool>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductListQuery {
    /// Validate into a repository filter and page request.
    ///
    /// # Errors
    ///
    /// `BadRequest` for an unknown sort, negative prices or
    /// `min_price > max_price`.
    pub fn into_filter(self) -> Result<(ProductFilter, PageRequest)> {
        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => ProductSort::default(),
            Some(raw) => raw.parse::<ProductSort>().map_err(AppError::BadRequest)?,
        };

        if self.min_price.is_some_and(|p| p.is_sign_negative())
            || self.max_price.is_some_and(|p| p.is_sign_negative())
        {
            return Err(AppError::BadRequest("prices cannot be negative".to_string()));
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price)
            && min > max
        {
            return Err(AppError::BadRequest(
                "min_price cannot exceed max_price".to_string(),
            ));
        }

        let non_blank = |s: Option<String>| {
            s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        let filter = ProductFilter {
            q: non_blank(self.q),
            category: non_blank(self.category),
            featured: self.featured,
            min_price: self.min_price,
            max_price: self.max_price,
            sort,
        };
        let page = PageRequest::new(self.page, self.per_page, DEFAULT_PER_PAGE, MAX_PER_PAGE);
        Ok((filter, page))
    }
}

/// One product in a listing.
#[derive(Debug, Serialize)]
pub struct ProductListItem {
    pub id: ProductId,
    pub slug: String,
    pub name: String,
    pub category: String,
    pub brand: Option<String>,
    pub price_min: Decimal,
    pub price_max: Decimal,
    pub compare_at_price: Option<Decimal>,
    pub image: Option<String>,
    pub is_featured: bool,
    pub in_stock: bool,
}

impl From<ProductSummary> for ProductListItem {
    fn from(p: ProductSummary) -> Self {
        let image = p.image().map(String::from);
        let in_stock = p.in_stock();
        Self {
            id: p.id,
            slug: p.slug,
            name: p.name,
            category: p.category,
            brand: p.brand,
            price_min: p.min_price,
            price_max: p.max_price,
            compare_at_price: p.compare_at_price,
            image,
            is_featured: p.is_featured,
            in_stock,
        }
    }
}

/// `GET /api/products`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<Json<Page<ProductListItem>>> {
    let (filter, page) = query.into_filter()?;
    let (items, total) = CatalogRepository::new(state.pool())
        .list_active(&filter, page)
        .await?;

    Ok(Json(Page::new(items, page, total).map(ProductListItem::from)))
}

/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ProductDetail>> {
    CatalogRepository::new(state.pool())
        .get_active_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let categories = CatalogRepository::new(state.pool()).categories().await?;
    Ok(Json(categories))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let (filter, page) = ProductListQuery::default().into_filter().unwrap();
        assert_eq!(filter.sort, ProductSort::Newest);
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), DEFAULT_PER_PAGE);
    }

    #[test]
    fn test_rejects_inverted_price_range() {
        let query = ProductListQuery {
            min_price: Some(Decimal::new(500, 0)),
            max_price: Some(Decimal::new(100, 0)),
            ..ProductListQuery::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_rejects_unknown_sort() {
        let query = ProductListQuery {
            sort: Some("popularity".into()),
            ..ProductListQuery::default()
        };
        assert!(matches!(query.into_filter(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_clamps_page_size_and_trims_search() {
        let query = ProductListQuery {
            q: Some("  lawn ".into()),
            category: Some("   ".into()),
            sort: Some("price_asc".into()),
            page: Some(0),
            per_page: Some(500),
            ..ProductListQuery::default()
        };
        let (filter, page) = query.into_filter().unwrap();
        assert_eq!(filter.q.as_deref(), Some("lawn"));
        assert_eq!(filter.category, None);
        assert_eq!(filter.sort, ProductSort::PriceAsc);
        assert_eq!(page.page(), 1);
        assert_eq!(page.per_page(), MAX_PER_PAGE);
    }
}
