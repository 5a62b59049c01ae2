//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                        - Liveness check
//! GET  /health/ready                  - Readiness check (database)
//!
//! # Auth
//! POST /api/auth/register             - Create account and log in (strict rate limit)
//! POST /api/auth/login                - Log in (strict rate limit)
//! POST /api/auth/logout               - Log out
//! GET  /api/auth/session              - Current user
//!
//! # Account (requires auth)
//! GET  /api/account/profile           - Profile
//! PUT  /api/account/profile           - Update profile
//! PUT  /api/account/password          - Change password
//!
//! # Catalog
//! GET  /api/products                  - Active products (filters, paginated)
//! GET  /api/products/categories       - Categories with counts
//! GET  /api/products/{id}             - Product with related products
//!
//! # Cart (requires auth)
//! GET    /api/cart                    - Cart with totals
//! DELETE /api/cart                    - Empty cart
//! GET    /api/cart/count              - Item count badge
//! POST   /api/cart/items              - Add item
//! PUT    /api/cart/items/{id}         - Set quantity (0 removes)
//! DELETE /api/cart/items/{id}         - Remove item
//!
//! # Orders (requires auth)
//! POST /api/orders                    - Checkout
//! GET  /api/orders                    - Order history
//! GET  /api/orders/{id}               - Order detail (owner or admin)
//! POST /api/orders/{id}/cancel        - Cancel a pending/confirmed order
//!
//! # Blog
//! GET  /api/posts                     - Published posts
//! GET  /api/posts/categories          - Categories with counts
//! GET  /api/posts/{slug}              - Post with rendered HTML
//!
//! # Admin (requires admin role)
//! GET  /api/admin/dashboard           - Store overview
//! *    /api/admin/users[/{id}]        - Account management
//! *    /api/admin/products[/{id}]     - Catalog management
//! *    /api/admin/posts[/{id}]        - Blog management
//! GET  /api/admin/orders              - All orders
//! PUT  /api/admin/orders/{id}         - Update status, payment, tracking
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod blog;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use crate::middleware::{api_rate_limiter, auth_rate_limiter, require_admin};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Only the credential checks get the strict limiter; clients poll
/// `/session` on every page load.
pub fn auth_routes(trust_proxy_headers: bool) -> Router<AppState> {
    let credentials = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(auth_rate_limiter(trust_proxy_headers));

    Router::new()
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session_user))
        .merge(credentials)
}

/// Create the account routes router.
pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(account::profile).put(account::update_profile),
        )
        .route("/password", put(account::change_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/categories", get(products::categories))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add_item))
        .route(
            "/items/{id}",
            put(cart::update_item).delete(cart::remove_item),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::checkout))
        .route("/{id}", get(orders::show))
        .route("/{id}/cancel", post(orders::cancel))
}

/// Create the blog routes router.
pub fn blog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(blog::index))
        .route("/categories", get(blog::categories))
        .route("/{slug}", get(blog::show))
}

/// Create the `/api` router.
///
/// The admin guard needs the state to re-check roles against the database.
pub fn api_routes(state: &AppState) -> Router<AppState> {
    let trust_proxy_headers = state.config().trust_proxy_headers;
    let admin = admin::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        require_admin,
    ));

    Router::new()
        .nest("/auth", auth_routes(trust_proxy_headers))
        .nest("/account", account_routes())
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/posts", blog_routes())
        .nest("/admin", admin)
        .layer(api_rate_limiter(trust_proxy_headers))
}

/// Create all routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(state))
}
