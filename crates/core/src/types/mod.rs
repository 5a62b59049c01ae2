//! Core types for Vitrine.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod pagination;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use pagination::{PageInfo, Paginated, Pagination};
pub use price::Price;
pub use slug::{Slug, SlugError};
pub use status::*;
