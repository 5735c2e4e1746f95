//! Dukaan Core - Shared types library.
//!
//! This crate provides common types used across all Dukaan components:
//! - `storefront` - Public-facing JSON API for the shop
//! - `admin` - Internal administration API
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains types and pure helpers, no HTTP clients. With the
//! `postgres` feature the record types also derive the `sqlx` traits needed
//! to read them straight out of a row, and `lock_claimed_quantities` gives
//! both binaries the one query refund planning depends on.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, prices, emails, and statuses
//! - [`models`] - Persisted records (products, orders, refunds, ...)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod models;
pub mod types;

pub use models::*;
pub use types::*;
