//! Repository behaviour against a real database.
//!
//! These tests require a migrated database (`dukaan migrate`) reachable at
//! `DATABASE_URL`. Every test creates its own product, shipping method and
//! customer under fresh slugs and SKUs, so they can share a database with
//! seeded data.
//!
//! Run with: cargo test -p dukaan-integration-tests --test database -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use tower_sessions::{MemoryStore, Session};
use uuid::Uuid;

use dukaan_admin::db::{
    OrderRepository as AdminOrderRepository, ProductRepository,
    RefundRepository as AdminRefundRepository,
};
use dukaan_admin::input::{NewProduct, NewVariant, OrderChanges, RefundChanges};
use dukaan_core::{
    CurrencyCode, Email, OrderDetail, OrderStatus, PaymentMethod, ProductDetail, RefundLineRequest,
    RefundPlanError, RefundStatus, ShippingMethodId, Variant,
};
use dukaan_storefront::db::orders::{NewOrder, NewOrderItem, PlaceOrderError};
use dukaan_storefront::db::refunds::CreateRefundError;
use dukaan_storefront::db::{CartRepository, CustomerRepository, OrderRepository, RefundRepository};
use dukaan_storefront::services::cart::{CartItem, CartOwner, CartService, merge_guest_cart};

async fn pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    PgPool::connect(&url).await.expect("Failed to connect to database")
}

fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn variant(sku: &str, stock: i32, position: i32) -> NewVariant {
    NewVariant {
        id: None,
        sku: sku.to_string(),
        label: format!("Size {position}"),
        price: Decimal::new(2500, 0),
        compare_at_price: None,
        stock,
        images: Vec::new(),
        position,
    }
}

/// An active product with two variants: the first has 5 units, the second 1.
async fn product(pool: &PgPool) -> ProductDetail {
    let slug = unique("lawn-kurta");
    ProductRepository::new(pool)
        .create(&NewProduct {
            slug: slug.clone(),
            name: "Lawn Kurta".to_string(),
            description: "Printed lawn, unstitched".to_string(),
            category: "women".to_string(),
            brand: None,
            base_price: Decimal::new(2500, 0),
            compare_at_price: None,
            images: Vec::new(),
            is_active: true,
            is_featured: false,
            variants: vec![
                variant(&format!("{slug}-m"), 5, 0),
                variant(&format!("{slug}-l"), 1, 1),
            ],
        })
        .await
        .expect("product created")
}

async fn shipping_method(pool: &PgPool) -> ShippingMethodId {
    sqlx::query_scalar("INSERT INTO shop.shipping_method (name, fee) VALUES ($1, 250) RETURNING id")
        .bind(unique("Standard"))
        .fetch_one(pool)
        .await
        .expect("shipping method created")
}

async fn stock_of(pool: &PgPool, variant: &Variant) -> i32 {
    sqlx::query_scalar("SELECT stock FROM shop.variant WHERE id = $1")
        .bind(variant.id)
        .fetch_one(pool)
        .await
        .expect("variant exists")
}

fn line(variant: &Variant, quantity: i32) -> NewOrderItem {
    NewOrderItem {
        product_id: variant.product_id,
        variant_id: variant.id,
        product_name: "Lawn Kurta".to_string(),
        variant_label: variant.label.clone(),
        sku: variant.sku.clone(),
        unit_price: variant.price,
        quantity,
        line_total: variant.price * Decimal::from(quantity),
    }
}

async fn place(
    pool: &PgPool,
    order_number: &str,
    items: &[NewOrderItem],
) -> Result<OrderDetail, PlaceOrderError> {
    let subtotal: Decimal = items.iter().map(|item| item.line_total).sum();
    let order = NewOrder {
        user_id: None,
        customer_name: "Sana Iqbal".to_string(),
        customer_email: Email::parse("sana@example.pk").expect("valid email"),
        customer_phone: "03001234567".to_string(),
        address_line1: Some("House 12, Street 4".to_string()),
        address_line2: None,
        city: Some("Lahore".to_string()),
        postal_code: None,
        shipping_method_id: shipping_method(pool).await,
        shipping_method_name: "Standard".to_string(),
        branch_id: None,
        payment_method: PaymentMethod::CashOnDelivery,
        subtotal,
        shipping_fee: Decimal::new(250, 0),
        total: subtotal + Decimal::new(250, 0),
        currency: CurrencyCode::PKR,
        notes: None,
    };
    OrderRepository::new(pool).place(order_number, &order, items).await
}

/// A delivered order for two units of the product's first variant.
async fn delivered_order(pool: &PgPool, product: &ProductDetail) -> OrderDetail {
    let placed = place(pool, &unique("DK"), &[line(&product.variants[0], 2)])
        .await
        .expect("order placed");

    AdminOrderRepository::new(pool)
        .update(
            placed.order.id,
            &OrderChanges {
                status: Some(OrderStatus::Delivered),
                ..OrderChanges::default()
            },
        )
        .await
        .expect("order delivered")
}

fn return_of(variant: &Variant, quantity: i32) -> Vec<RefundLineRequest> {
    vec![RefundLineRequest {
        variant_id: variant.id,
        quantity,
    }]
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_checkout_rolls_back_when_a_stock_guard_fails() {
    let pool = pool().await;
    let product = product(&pool).await;
    let (medium, large) = (&product.variants[0], &product.variants[1]);
    let number = unique("DK");

    let err = place(&pool, &number, &[line(medium, 2), line(large, 3)])
        .await
        .expect_err("second line exceeds stock");
    assert!(matches!(err, PlaceOrderError::InsufficientStock(ref sku) if *sku == large.sku));

    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.orders WHERE order_number = $1")
        .bind(&number)
        .fetch_one(&pool)
        .await
        .unwrap();
    let items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shop.order_item WHERE variant_id = $1")
        .bind(medium.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(orders, 0);
    assert_eq!(items, 0);
    assert_eq!(stock_of(&pool, medium).await, 5);
    assert_eq!(stock_of(&pool, large).await, 1);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_approving_a_refund_twice_restocks_once() {
    let pool = pool().await;
    let product = product(&pool).await;
    let medium = &product.variants[0];
    let order = delivered_order(&pool, &product).await;
    assert_eq!(stock_of(&pool, medium).await, 3);

    let refund = RefundRepository::new(&pool)
        .create(&order, "Wrong size", &return_of(medium, 2))
        .await
        .expect("refund recorded");

    let admin = AdminRefundRepository::new(&pool);
    let approve = RefundChanges {
        status: Some(RefundStatus::Approved),
        ..RefundChanges::default()
    };
    let first = admin.update(refund.refund.id, &approve).await.unwrap();
    assert!(first.refund.restocked);
    assert_eq!(stock_of(&pool, medium).await, 5);

    admin.update(refund.refund.id, &approve).await.unwrap();
    let refunded = RefundChanges {
        status: Some(RefundStatus::Refunded),
        ..RefundChanges::default()
    };
    admin.update(refund.refund.id, &refunded).await.unwrap();
    assert_eq!(stock_of(&pool, medium).await, 5);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_concurrent_refund_requests_cannot_claim_the_same_units() {
    let pool = pool().await;
    let product = product(&pool).await;
    let medium = &product.variants[0];
    let order = delivered_order(&pool, &product).await;
    let lines = return_of(medium, 2);

    let customer = RefundRepository::new(&pool);
    let staff = AdminRefundRepository::new(&pool);
    let (first, second) = tokio::join!(
        customer.create(&order, "Too small", &lines),
        staff.create(&order, "Customer called", &lines, None, true),
    );

    let accepted = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(accepted, 1, "exactly one refund may claim both units");
    if let Err(err) = first {
        assert!(matches!(
            err,
            CreateRefundError::Plan(RefundPlanError::ExceedsRefundable { available: 0, .. })
        ));
    }
    if let Err(err) = second {
        assert!(matches!(
            err,
            dukaan_admin::db::refunds::CreateRefundError::Plan(
                RefundPlanError::ExceedsRefundable { available: 0, .. }
            )
        ));
    }
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_deleting_a_product_keeps_its_refund_lines() {
    let pool = pool().await;
    let product = product(&pool).await;
    let medium = &product.variants[0];
    let order = delivered_order(&pool, &product).await;
    let refund = RefundRepository::new(&pool)
        .create(&order, "Colour faded", &return_of(medium, 1))
        .await
        .unwrap();

    ProductRepository::new(&pool)
        .delete(product.product.id)
        .await
        .unwrap();

    let stored = AdminRefundRepository::new(&pool)
        .get(refund.refund.id)
        .await
        .unwrap()
        .expect("refund still exists");
    assert_eq!(stored.items.len(), 1);
    let item = &stored.items[0];
    assert_eq!(item.variant_id, None);
    assert_eq!(item.sku, medium.sku);
    assert_eq!(item.product_name, "Lawn Kurta");
    assert_eq!(
        item.unit_price * Decimal::from(item.quantity),
        stored.refund.amount
    );

    // Approving after the delete has no variant to restock and must not fail.
    let approved = AdminRefundRepository::new(&pool)
        .update(
            refund.refund.id,
            &RefundChanges {
                status: Some(RefundStatus::Approved),
                ..RefundChanges::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(approved.refund.status, RefundStatus::Approved);
}

#[tokio::test]
#[ignore = "Requires a migrated PostgreSQL database (DATABASE_URL)"]
async fn test_login_merges_guest_cart_into_stored_cart() {
    let pool = pool().await;
    let product = product(&pool).await;
    let (medium, large) = (&product.variants[0], &product.variants[1]);

    let email = Email::parse(&format!("{}@example.pk", unique("shopper"))).unwrap();
    let customer = CustomerRepository::new(&pool)
        .create(&email, "Ayesha Khan", "$argon2id$v=19$placeholder")
        .await
        .unwrap();
    CartRepository::new(&pool)
        .upsert_line(
            customer.id,
            CartItem {
                variant_id: medium.id,
                quantity: 1,
            },
        )
        .await
        .unwrap();

    let session = Session::new(None, Arc::new(MemoryStore::default()), None);
    let guest = CartService::new(&pool, CartOwner::Guest(&session));
    guest.add(medium.id, 2).await.unwrap();
    guest.add(large.id, 1).await.unwrap();

    let view = merge_guest_cart(&pool, &session, customer.id).await.unwrap();
    assert_eq!(view.lines.len(), 2);

    let stored = CartRepository::new(&pool).lines(customer.id).await.unwrap();
    assert_eq!(
        stored,
        vec![
            CartItem {
                variant_id: medium.id,
                quantity: 3,
            },
            CartItem {
                variant_id: large.id,
                quantity: 1,
            },
        ]
    );
    assert!(guest.items().await.unwrap().is_empty());
}
