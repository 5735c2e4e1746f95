//! Dukaan storefront library.
//!
//! The public JSON API as a library so the binary, the route tests and the
//! cross-crate integration tests all build the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
