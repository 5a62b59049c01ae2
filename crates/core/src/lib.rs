//! Vitrine Core - Shared domain types.
//!
//! This crate provides the types used across all Vitrine components:
//! - `storefront` - JSON API for the shop, blog and admin area
//! - `cli` - Command-line tools for migrations, seeding and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP. Database encoding is opt-in via the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, slugs, prices, statuses and pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
