//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Customer registration and password login
//! - `cart` - Guest and customer carts, merge on login
//! - `checkout` - Shipping quotes and order placement
//! - `tracking` - Order lookup by number and email with courier status
//! - `tcs` - TCS courier tracking client
//! - `rag` - Keyword pseudo-embedding search over the knowledge corpus
//! - `assistant` - MCP-style tools and the scripted assistant turn

pub mod assistant;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod rag;
pub mod tcs;
pub mod tracking;
