//! Admin API handlers.
//!
//! Everything here is mounted under `/api/admin` behind
//! [`require_admin`](crate::middleware::require_admin).

pub mod dashboard;
pub mod orders;
pub mod posts;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{get, put},
};
use serde::Serialize;

use crate::state::AppState;

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::index))
        .route("/users", get(users::index))
        .route(
            "/users/{id}",
            get(users::show).put(users::update).delete(users::delete),
        )
        .route("/products", get(products::index).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/posts", get(posts::index).post(posts::create))
        .route(
            "/posts/{id}",
            get(posts::show).put(posts::update).delete(posts::delete),
        )
        .route("/orders", get(orders::index))
        .route("/orders/{id}", put(orders::update))
}

/// Confirmation body for deletes.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub message: &'static str,
}
