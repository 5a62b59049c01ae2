//! Integration tests for Vitrine.
//!
//! These tests drive a running storefront over HTTP and are `#[ignore]`d by
//! default.
//!
//! # Running Tests
//!
//! ```bash
//! # Migrate and start the server against a scratch database. Each test
//! # client sends its own `x-real-ip`, so the server must trust it.
//! cargo run -p vitrine-cli -- migrate
//! VITRINE_TRUST_PROXY_HEADERS=true cargo run -p vitrine-storefront
//!
//! # In another shell
//! cargo test -p vitrine-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `VITRINE_TEST_BASE_URL` - server under test (default `http://localhost:3000`)
//! - `VITRINE_DATABASE_URL` - same database as the server; used to grant the
//!   admin role, which the API cannot do for the first admin
//!
//! `tests/last_admin.rs` demotes every other admin, so it lives in its own
//! test binary; cargo runs test binaries one at a time.

#![allow(clippy::missing_panics_doc)]

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use sqlx::PgPool;
use uuid::Uuid;

use vitrine_core::{Email, UserRole};
use vitrine_storefront::db::{UserRepository, create_pool};

/// Password used for every test account.
pub const TEST_PASSWORD: &str = "senha-de-teste-123";

/// An HTTP client with its own cookie jar and its own client IP.
///
/// Each client sends a random `x-real-ip` so the per-IP auth rate limit
/// does not leak between tests.
pub struct TestClient {
    client: Client,
    base_url: String,
}

impl TestClient {
    #[must_use]
    pub fn new() -> Self {
        dotenvy::dotenv().ok();

        let base_url = std::env::var("VITRINE_TEST_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_owned());

        let [a, b, c, ..] = Uuid::new_v4().into_bytes();
        let ip = format!("10.{a}.{b}.{c}");
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-real-ip",
            HeaderValue::from_str(&ip).expect("IPv4 text is a valid header"),
        );

        let client = Client::builder()
            .cookie_store(true)
            .default_headers(headers)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed")
    }

    pub async fn put(&self, path: &str, body: &Value) -> Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed")
    }

    pub async fn delete(&self, path: &str) -> Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed")
    }

    /// Register a fresh account and stay logged in. Returns its email.
    pub async fn register(&self, name: &str) -> String {
        let email = unique_email(name);
        let response = self
            .post(
                "/api/auth/register",
                &json!({
                    "name": name,
                    "email": email,
                    "password": TEST_PASSWORD,
                    "confirm_password": TEST_PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED, "register {email}");
        email
    }

    pub async fn login(&self, email: &str) -> Response {
        self.post(
            "/api/auth/login",
            &json!({ "email": email, "password": TEST_PASSWORD }),
        )
        .await
    }
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A logged-in client whose account has the admin role.
pub async fn admin_client() -> TestClient {
    admin_account().await.0
}

/// A logged-in admin client and its email.
pub async fn admin_account() -> (TestClient, String) {
    let client = TestClient::new();
    let email = client.register("admin").await;
    set_role(&email, UserRole::Admin).await;

    // The session records the role at login
    let response = client.login(&email).await;
    assert_eq!(response.status(), StatusCode::OK);
    (client, email)
}

/// Pool on the server's database.
pub async fn test_pool() -> PgPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("VITRINE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .expect("VITRINE_DATABASE_URL must be set for admin tests");

    create_pool(&database_url)
        .await
        .expect("Failed to connect to test database")
}

/// Change a role directly in the database.
pub async fn set_role(email: &str, role: UserRole) {
    let pool = test_pool().await;
    let email = Email::parse(email).expect("test emails are valid");
    UserRepository::new(&pool)
        .set_role_by_email(&email, role)
        .await
        .expect("Failed to change test user role");
}

/// A unique, valid email address.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", Uuid::new_v4().simple())
}

/// Create a product through the admin API and return its JSON.
pub async fn create_product(admin: &TestClient, stock: i32, sizes: &[&str]) -> Value {
    let response = admin
        .post(
            "/api/admin/products",
            &json!({
                "name": format!("Produto {}", Uuid::new_v4().simple()),
                "description": "Produto de teste",
                "price": "50.00",
                "image": "/img/teste.jpg",
                "category": "teste",
                "stock": stock,
                "sizes": sizes,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("product JSON")
}

/// Current stock of a product, read through the admin API.
pub async fn product_stock(admin: &TestClient, product_id: &Value) -> i64 {
    let product: Value = admin
        .get(&format!("/api/admin/products/{product_id}"))
        .await
        .json()
        .await
        .expect("product JSON");
    product["stock"].as_i64().expect("stock is a number")
}

/// A shipping address that passes validation.
#[must_use]
pub fn shipping_address() -> Value {
    json!({
        "name": "Maria Souza",
        "street": "Avenida Paulista",
        "number": "1000",
        "neighborhood": "Bela Vista",
        "city": "São Paulo",
        "state": "sp",
        "zip_code": "01310-100",
    })
}

/// Put `quantity` units of a product in the cart and check out.
pub async fn place_order(customer: &TestClient, product_id: &Value, quantity: i32) -> Value {
    let response = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product_id, "quantity": quantity }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = customer
        .post(
            "/api/orders",
            &json!({ "shipping_address": shipping_address(), "payment_method": "pix" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.expect("order JSON")
}
