//! Domain models for the storefront.
//!
//! These types are what handlers work with and what the API serializes.
//! Database row types stay private to the `db` module.

pub mod cart;
pub mod order;
pub mod post;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartLine};
pub use order::{
    NewOrder, Order, OrderCustomer, OrderFilter, OrderItem, OrderUpdate, ShippingAddress,
};
pub use post::{Post, PostFilter, PostInput, PostSummary};
pub use product::{CategoryCount, Product, ProductFilter, ProductInput, ProductSort};
pub use session::{CurrentUser, keys as session_keys};
pub use user::{User, UserFilter, UserProfile};
