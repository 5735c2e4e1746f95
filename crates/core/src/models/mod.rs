//! Persisted records shared by the storefront, admin panel and CLI.
//!
//! These are plain data carriers. Validation of user input happens at the
//! route/service boundary of the binary that accepts it; the records here
//! only describe what a row looks like.

pub mod careers;
pub mod catalog;
pub mod content;
pub mod order;
pub mod refund;
pub mod shipping;

pub use careers::JobApplication;
pub use catalog::{Product, ProductDetail, Variant};
pub use content::{Banner, Branch};
pub use order::{Order, OrderDetail, OrderItem};
#[cfg(feature = "postgres")]
pub use refund::lock_claimed_quantities;
pub use refund::{
    PlannedRefundLine, Refund, RefundDetail, RefundItem, RefundLineRequest, RefundPlan,
    RefundPlanError, plan_refund,
};
pub use shipping::ShippingMethod;
