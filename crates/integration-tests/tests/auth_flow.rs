//! Account lifecycle against a running server.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use vitrine_integration_tests::{TEST_PASSWORD, TestClient, unique_email};

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_health_endpoints() {
    let client = TestClient::new();

    let response = client.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");

    let response = client.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_register_session_logout() {
    let client = TestClient::new();
    let email = client.register("Maria").await;

    let response = client.get("/api/auth/session").await;
    assert_eq!(response.status(), StatusCode::OK);
    let user: Value = response.json().await.unwrap();
    assert_eq!(user["email"], email.as_str());
    assert_eq!(user["role"], "user");
    assert!(user.get("password_hash").is_none());

    let response = client.post("/api/auth/logout", &json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get("/api/auth/session").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Faça login para continuar");
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_duplicate_email_is_rejected() {
    let client = TestClient::new();
    let email = client.register("Joana").await;

    let other = TestClient::new();
    let response = other
        .post(
            "/api/auth/register",
            &json!({
                "name": "Joana",
                // Case differs; emails are stored lowercased
                "email": email.to_uppercase(),
                "password": TEST_PASSWORD,
                "confirm_password": TEST_PASSWORD,
            }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_wrong_password_is_unauthorized() {
    let client = TestClient::new();
    let email = client.register("Paulo").await;
    client.post("/api/auth/logout", &json!({})).await;

    let response = client
        .post(
            "/api/auth/login",
            &json!({ "email": email, "password": "nao-e-esta" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client
        .post(
            "/api/auth/login",
            &json!({ "email": unique_email("ninguem"), "password": TEST_PASSWORD }),
        )
        .await;
    // Unknown accounts look the same as wrong passwords
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = client.login(&email).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_auth_endpoints_are_rate_limited() {
    let client = TestClient::new();
    let body = json!({ "email": unique_email("limite"), "password": TEST_PASSWORD });

    let mut statuses = Vec::new();
    for _ in 0..8 {
        statuses.push(client.post("/api/auth/login", &body).await.status());
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}
