//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password registration, login and password changes
//! - `markdown` - Blog post rendering with a per-revision cache

pub mod auth;
pub mod markdown;

pub use markdown::MarkdownRenderer;
