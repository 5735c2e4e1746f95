//! Dukaan Admin library.
//!
//! The admin JSON API as a library, so the binary, the CLI and the
//! integration tests share the same router, repositories and validation.
//!
//! # Security
//!
//! This crate writes the catalog, content, orders and refunds. Every route
//! except login requires an admin session; viewers are read-only.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod input;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
