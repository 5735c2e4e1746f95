//! Cart state and arithmetic.
//!
//! Guests keep their cart in the session; logged-in customers keep it in
//! `shop.cart_line`. Both hold a list of [`CartItem`]s and are hydrated from
//! current catalog data on every read, so prices and stock are never stale.
//! There is no locking: whichever write lands last wins.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;

use dukaan_core::{CurrencyCode, ProductId, UserId, VariantId, round_money};

use crate::db::catalog::CartVariant;
use crate::db::{CartRepository, CatalogRepository, RepositoryError};
use crate::models::session_keys;

/// Upper bound on the quantity of a single line.
pub const MAX_LINE_QUANTITY: u32 = 10;

/// One cart line as stored: which variant and how many.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub variant_id: VariantId,
    pub quantity: u32,
}

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("product variant {0} not found")]
    VariantNotFound(VariantId),

    #[error("{0} is out of stock")]
    OutOfStock(String),

    #[error("variant {0} is not in the cart")]
    LineNotFound(VariantId),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A hydrated cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub variant_id: VariantId,
    pub product_id: ProductId,
    pub product_slug: String,
    pub product_name: String,
    pub label: String,
    pub sku: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub line_total: Decimal,
    pub available_stock: i32,
}

impl CartLine {
    /// Whether the line asks for more units than are on hand.
    #[must_use]
    pub fn exceeds_stock(&self) -> bool {
        i64::from(self.quantity) > i64::from(self.available_stock.max(0))
    }
}

/// A hydrated cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub item_count: u32,
    pub currency: CurrencyCode,
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

// =============================================================================
// Pure cart arithmetic
// =============================================================================

/// Clamp a requested quantity to `1..=MAX_LINE_QUANTITY` and to stock.
///
/// Returns 0 only when nothing is in stock.
#[must_use]
pub fn clamp_quantity(requested: u32, stock: i32) -> u32 {
    let stock = u32::try_from(stock).unwrap_or(0);
    requested.clamp(1, MAX_LINE_QUANTITY).min(stock)
}

fn purchasable(variant: &CartVariant) -> Result<(), CartError> {
    if !variant.product_active {
        return Err(CartError::VariantNotFound(variant.variant_id));
    }
    if variant.stock <= 0 {
        return Err(CartError::OutOfStock(variant.sku.clone()));
    }
    Ok(())
}

/// Add `quantity` units of `variant`, summing with an existing line.
///
/// Returns the line as stored after clamping.
///
/// # Errors
///
/// `InvalidQuantity` for 0, `VariantNotFound` for inactive products and
/// `OutOfStock` when no unit is available.
pub fn add_item(
    items: &mut Vec<CartItem>,
    variant: &CartVariant,
    quantity: u32,
) -> Result<CartItem, CartError> {
    if quantity == 0 {
        return Err(CartError::InvalidQuantity);
    }
    purchasable(variant)?;

    if let Some(existing) = items
        .iter_mut()
        .find(|item| item.variant_id == variant.variant_id)
    {
        existing.quantity = clamp_quantity(existing.quantity.saturating_add(quantity), variant.stock);
        return Ok(*existing);
    }

    let item = CartItem {
        variant_id: variant.variant_id,
        quantity: clamp_quantity(quantity, variant.stock),
    };
    items.push(item);
    Ok(item)
}

/// Set a line's quantity. `0` removes the line.
///
/// Returns the stored line, or `None` when it was removed.
///
/// # Errors
///
/// `LineNotFound` when the variant is not in the cart, plus the
/// availability errors of [`add_item`].
pub fn set_item_quantity(
    items: &mut Vec<CartItem>,
    variant: &CartVariant,
    quantity: u32,
) -> Result<Option<CartItem>, CartError> {
    let position = items
        .iter()
        .position(|item| item.variant_id == variant.variant_id)
        .ok_or(CartError::LineNotFound(variant.variant_id))?;

    if quantity == 0 {
        items.remove(position);
        return Ok(None);
    }
    purchasable(variant)?;

    let line = items
        .get_mut(position)
        .ok_or(CartError::LineNotFound(variant.variant_id))?;
    line.quantity = clamp_quantity(quantity, variant.stock);
    Ok(Some(*line))
}

/// Normalize client-supplied lines: duplicates are summed in first-seen
/// order, unknown or unavailable variants are dropped, quantities clamped.
#[must_use]
pub fn sanitize_items(
    items: &[CartItem],
    variants: &HashMap<VariantId, CartVariant>,
) -> Vec<CartItem> {
    merge_items(&[], items, variants)
}

/// Merge a guest cart into a customer's cart.
///
/// The customer's lines come first in their existing order, followed by
/// variants only the guest had, in guest order. Quantities for the same
/// variant are summed and then clamped. Lines that can no longer be bought
/// are dropped.
#[must_use]
pub fn merge_items(
    existing: &[CartItem],
    guest: &[CartItem],
    variants: &HashMap<VariantId, CartVariant>,
) -> Vec<CartItem> {
    let mut order: Vec<VariantId> = Vec::new();
    let mut totals: HashMap<VariantId, u32> = HashMap::new();

    for item in existing.iter().chain(guest) {
        let total = totals.entry(item.variant_id).or_insert_with(|| {
            order.push(item.variant_id);
            0
        });
        *total = total.saturating_add(item.quantity);
    }

    order
        .into_iter()
        .filter_map(|variant_id| {
            let variant = variants.get(&variant_id)?;
            let requested = totals.get(&variant_id).copied().unwrap_or(0);
            if requested == 0 || purchasable(variant).is_err() {
                return None;
            }
            Some(CartItem {
                variant_id,
                quantity: clamp_quantity(requested, variant.stock),
            })
        })
        .collect()
}

/// Build the cart view from stored lines and current catalog rows.
///
/// Lines whose variant disappeared or whose product was deactivated are
/// left out. Quantities are shown as stored; checkout refuses lines that
/// exceed stock.
#[must_use]
pub fn hydrate(items: &[CartItem], variants: &HashMap<VariantId, CartVariant>) -> CartView {
    let lines: Vec<CartLine> = items
        .iter()
        .filter_map(|item| {
            let variant = variants.get(&item.variant_id)?;
            if !variant.product_active {
                return None;
            }
            Some(CartLine {
                variant_id: variant.variant_id,
                product_id: variant.product_id,
                product_slug: variant.product_slug.clone(),
                product_name: variant.product_name.clone(),
                label: variant.label.clone(),
                sku: variant.sku.clone(),
                image: variant.image.clone(),
                unit_price: variant.price,
                quantity: item.quantity,
                line_total: round_money(variant.price * Decimal::from(item.quantity)),
                available_stock: variant.stock,
            })
        })
        .collect();

    let subtotal = round_money(lines.iter().map(|line| line.line_total).sum());
    let item_count = lines.iter().map(|line| line.quantity).sum();

    CartView {
        lines,
        subtotal,
        item_count,
        currency: CurrencyCode::default(),
    }
}

// =============================================================================
// Storage
// =============================================================================

/// Where the caller's cart lives.
#[derive(Clone, Copy)]
pub enum CartOwner<'a> {
    Guest(&'a Session),
    Customer(UserId),
}

/// Cart operations for one caller.
pub struct CartService<'a> {
    pool: &'a PgPool,
    owner: CartOwner<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, owner: CartOwner<'a>) -> Self {
        Self { pool, owner }
    }

    /// Stored lines, unhydrated.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the session or database cannot be read.
    pub async fn items(&self) -> Result<Vec<CartItem>, CartError> {
        match self.owner {
            CartOwner::Guest(session) => Ok(load_guest_items(session).await?),
            CartOwner::Customer(user_id) => Ok(CartRepository::new(self.pool).lines(user_id).await?),
        }
    }

    /// The hydrated cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the cart or catalog cannot be read.
    pub async fn view(&self) -> Result<CartView, CartError> {
        let items = self.items().await?;
        self.hydrate(&items).await
    }

    /// Add units of a variant.
    ///
    /// # Errors
    ///
    /// See [`add_item`]; unknown variants give `VariantNotFound`.
    pub async fn add(&self, variant_id: VariantId, quantity: u32) -> Result<CartView, CartError> {
        let variant = self.variant(variant_id).await?;
        let mut items = self.items().await?;
        let line = add_item(&mut items, &variant, quantity)?;
        self.store_line(&items, line).await?;
        self.hydrate(&items).await
    }

    /// Set a line's quantity (0 removes it).
    ///
    /// # Errors
    ///
    /// See [`set_item_quantity`].
    pub async fn set_quantity(
        &self,
        variant_id: VariantId,
        quantity: u32,
    ) -> Result<CartView, CartError> {
        let variant = self.variant(variant_id).await?;
        let mut items = self.items().await?;
        match set_item_quantity(&mut items, &variant, quantity)? {
            Some(line) => self.store_line(&items, line).await?,
            None => self.store_removal(&items, variant_id).await?,
        }
        self.hydrate(&items).await
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// `LineNotFound` when the variant is not in the cart.
    pub async fn remove(&self, variant_id: VariantId) -> Result<CartView, CartError> {
        let mut items = self.items().await?;
        let before = items.len();
        items.retain(|item| item.variant_id != variant_id);
        if items.len() == before {
            return Err(CartError::LineNotFound(variant_id));
        }
        self.store_removal(&items, variant_id).await?;
        self.hydrate(&items).await
    }

    /// Replace the whole cart with client state.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if the catalog or storage fails.
    pub async fn replace(&self, items: &[CartItem]) -> Result<CartView, CartError> {
        let ids: Vec<VariantId> = items.iter().map(|item| item.variant_id).collect();
        let variants = self.variants(&ids).await?;
        let items = sanitize_items(items, &variants);
        self.store_all(&items).await?;
        Ok(hydrate(&items, &variants))
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn clear(&self) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Guest(session) => {
                session.remove::<Vec<CartItem>>(session_keys::GUEST_CART).await?;
            }
            CartOwner::Customer(user_id) => CartRepository::new(self.pool).clear(user_id).await?,
        }
        Ok(())
    }

    async fn variant(&self, variant_id: VariantId) -> Result<CartVariant, CartError> {
        CatalogRepository::new(self.pool)
            .cart_variant(variant_id)
            .await?
            .ok_or(CartError::VariantNotFound(variant_id))
    }

    async fn variants(
        &self,
        ids: &[VariantId],
    ) -> Result<HashMap<VariantId, CartVariant>, CartError> {
        Ok(CatalogRepository::new(self.pool)
            .cart_variants(ids)
            .await?
            .into_iter()
            .map(|v| (v.variant_id, v))
            .collect())
    }

    async fn hydrate(&self, items: &[CartItem]) -> Result<CartView, CartError> {
        let ids: Vec<VariantId> = items.iter().map(|item| item.variant_id).collect();
        let variants = self.variants(&ids).await?;
        Ok(hydrate(items, &variants))
    }

    async fn store_line(&self, items: &[CartItem], line: CartItem) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Guest(session) => save_guest_items(session, items).await?,
            CartOwner::Customer(user_id) => {
                CartRepository::new(self.pool).upsert_line(user_id, line).await?;
            }
        }
        Ok(())
    }

    async fn store_removal(&self, items: &[CartItem], variant_id: VariantId) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Guest(session) => save_guest_items(session, items).await?,
            CartOwner::Customer(user_id) => {
                CartRepository::new(self.pool)
                    .remove_line(user_id, variant_id)
                    .await?;
            }
        }
        Ok(())
    }

    async fn store_all(&self, items: &[CartItem]) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Guest(session) => save_guest_items(session, items).await?,
            CartOwner::Customer(user_id) => CartRepository::new(self.pool).replace(user_id, items).await?,
        }
        Ok(())
    }
}

/// Merge the session's guest cart into the customer's stored cart and clear
/// the guest cart. Called right after login.
///
/// # Errors
///
/// Returns `CartError` if the session, catalog or database fails.
pub async fn merge_guest_cart(
    pool: &PgPool,
    session: &Session,
    user_id: UserId,
) -> Result<CartView, CartError> {
    let guest = load_guest_items(session).await?;
    let customer = CartService::new(pool, CartOwner::Customer(user_id));
    if guest.is_empty() {
        return customer.view().await;
    }

    let existing = customer.items().await?;
    let ids: Vec<VariantId> = existing
        .iter()
        .chain(&guest)
        .map(|item| item.variant_id)
        .collect();
    let variants = customer.variants(&ids).await?;
    let merged = merge_items(&existing, &guest, &variants);

    customer.store_all(&merged).await?;
    session.remove::<Vec<CartItem>>(session_keys::GUEST_CART).await?;

    tracing::info!(
        user_id = %user_id,
        guest_lines = guest.len(),
        merged_lines = merged.len(),
        "Merged guest cart"
    );

    Ok(hydrate(&merged, &variants))
}

async fn load_guest_items(session: &Session) -> Result<Vec<CartItem>, tower_sessions::session::Error> {
    Ok(session
        .get::<Vec<CartItem>>(session_keys::GUEST_CART)
        .await?
        .unwrap_or_default())
}

async fn save_guest_items(
    session: &Session,
    items: &[CartItem],
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::GUEST_CART, items).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn variant(id: i32, stock: i32, price: i64) -> CartVariant {
        CartVariant {
            variant_id: VariantId::new(id),
            product_id: ProductId::new(1),
            product_slug: "khaddar-shawl".into(),
            product_name: "Khaddar Shawl".into(),
            product_active: true,
            sku: format!("KS-{id}"),
            label: "Free size".into(),
            price: Decimal::new(price, 0),
            stock,
            image: None,
        }
    }

    fn item(id: i32, quantity: u32) -> CartItem {
        CartItem {
            variant_id: VariantId::new(id),
            quantity,
        }
    }

    fn catalog(variants: &[CartVariant]) -> HashMap<VariantId, CartVariant> {
        variants.iter().map(|v| (v.variant_id, v.clone())).collect()
    }

    #[test]
    fn test_clamp_quantity() {
        assert_eq!(clamp_quantity(0, 5), 1);
        assert_eq!(clamp_quantity(3, 5), 3);
        assert_eq!(clamp_quantity(30, 50), MAX_LINE_QUANTITY);
        assert_eq!(clamp_quantity(8, 4), 4);
        assert_eq!(clamp_quantity(2, 0), 0);
        assert_eq!(clamp_quantity(2, -3), 0);
    }

    #[test]
    fn test_add_item_sums_and_clamps() {
        let v = variant(1, 6, 1200);
        let mut items = Vec::new();
        assert_eq!(add_item(&mut items, &v, 4).unwrap().quantity, 4);
        assert_eq!(add_item(&mut items, &v, 4).unwrap().quantity, 6);
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_add_item_rejects_unavailable() {
        let mut items = Vec::new();
        assert!(matches!(
            add_item(&mut items, &variant(1, 0, 100), 1),
            Err(CartError::OutOfStock(sku)) if sku == "KS-1"
        ));

        let mut inactive = variant(2, 5, 100);
        inactive.product_active = false;
        assert!(matches!(
            add_item(&mut items, &inactive, 1),
            Err(CartError::VariantNotFound(_))
        ));
        assert!(matches!(
            add_item(&mut items, &variant(3, 5, 100), 0),
            Err(CartError::InvalidQuantity)
        ));
        assert!(items.is_empty());
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let v = variant(1, 9, 100);
        let mut items = vec![item(1, 2), item(2, 1)];
        assert_eq!(set_item_quantity(&mut items, &v, 0).unwrap(), None);
        assert_eq!(items, vec![item(2, 1)]);
        assert!(matches!(
            set_item_quantity(&mut items, &v, 3),
            Err(CartError::LineNotFound(_))
        ));
    }

    #[test]
    fn test_merge_keeps_existing_order_then_guest_order() {
        let variants = catalog(&[
            variant(1, 20, 100),
            variant(2, 3, 100),
            variant(3, 20, 100),
            variant(4, 20, 100),
        ]);
        let existing = [item(2, 2), item(1, 1)];
        let guest = [item(4, 1), item(2, 2), item(3, 12)];

        let merged = merge_items(&existing, &guest, &variants);
        assert_eq!(
            merged,
            vec![item(2, 3), item(1, 1), item(4, 1), item(3, MAX_LINE_QUANTITY)]
        );
    }

    #[test]
    fn test_merge_drops_unknown_and_sold_out() {
        let variants = catalog(&[variant(1, 0, 100), variant(2, 5, 100)]);
        let merged = merge_items(&[item(1, 1)], &[item(2, 1), item(9, 1)], &variants);
        assert_eq!(merged, vec![item(2, 1)]);
    }

    #[test]
    fn test_sanitize_sums_duplicates() {
        let variants = catalog(&[variant(1, 20, 100)]);
        assert_eq!(
            sanitize_items(&[item(1, 2), item(1, 3)], &variants),
            vec![item(1, 5)]
        );
    }

    #[test]
    fn test_hydrate_totals() {
        let variants = catalog(&[variant(1, 20, 1250), variant(2, 1, 999)]);
        let view = hydrate(&[item(1, 2), item(2, 3), item(7, 1)], &variants);
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.subtotal, Decimal::new(5497, 0));
        assert_eq!(view.item_count, 5);
        assert!(!view.lines[0].exceeds_stock());
        assert!(view.lines[1].exceeds_stock());
    }
}
