//! Admin API against a running server.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use vitrine_core::UserRole;
use vitrine_integration_tests::{
    TestClient, admin_account, admin_client, create_product, place_order, product_stock, set_role,
};

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_customers_cannot_reach_admin() {
    let anonymous = TestClient::new();
    let response = anonymous.get("/api/admin/dashboard").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let customer = TestClient::new();
    customer.register("Curioso").await;
    let response = customer.get("/api/admin/dashboard").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Acesso restrito a administradores");
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_dashboard_counts() {
    let admin = admin_client().await;
    let response = admin.get("/api/admin/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let dashboard: Value = response.json().await.unwrap();
    assert!(dashboard["users"].as_i64().unwrap() >= 1);
    assert!(dashboard["recent_orders"].is_array());
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_inactive_products_are_hidden_from_catalog() {
    let admin = admin_client().await;
    let product = create_product(&admin, 3, &[]).await;
    let path = format!("/api/products/{}", product["id"]);

    let shopper = TestClient::new();
    assert_eq!(shopper.get(&path).await.status(), StatusCode::OK);

    let mut update = product.clone();
    update["active"] = json!(false);
    update["price"] = json!("50.00");
    let response = admin
        .put(&format!("/api/admin/products/{}", product["id"]), &update)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(shopper.get(&path).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_blog_post_lifecycle() {
    let admin = admin_client().await;
    let slug = format!("guia-{}", Uuid::new_v4().simple());
    let post = json!({
        "title": "Guia de tamanhos",
        "slug": slug,
        "summary": "Como escolher o tamanho certo",
        "content": "# Medidas\n\nUse uma fita métrica.",
        "author": "Equipe",
        "category": "guias",
        "image": "/img/guia.jpg",
        "published": false,
    });

    let response = admin.post("/api/admin/posts", &post).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Value = response.json().await.unwrap();

    // Drafts are not public
    let reader = TestClient::new();
    let path = format!("/api/posts/{slug}");
    assert_eq!(reader.get(&path).await.status(), StatusCode::NOT_FOUND);

    // Slugs are unique
    let response = admin.post("/api/admin/posts", &post).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"]["slug"].is_string());

    let mut published = post.clone();
    published["published"] = json!(true);
    let response = admin
        .put(&format!("/api/admin/posts/{}", created["id"]), &published)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = reader.get(&path).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail: Value = response.json().await.unwrap();
    let html = detail["content_html"].as_str().unwrap();
    assert!(html.contains("<h1"));
    assert!(html.contains("Medidas"));

    let response = admin
        .delete(&format!("/api/admin/posts/{}", created["id"]))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(reader.get(&path).await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_admin_cannot_delete_self() {
    let admin = admin_client().await;
    let me: Value = admin.get("/api/auth/session").await.json().await.unwrap();

    let response = admin
        .delete(&format!("/api/admin/users/{}", me["id"]))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_admin_cancel_restores_stock_once() {
    let admin = admin_client().await;
    let product = create_product(&admin, 5, &[]).await;

    let customer = TestClient::new();
    customer.register("Cancelado").await;
    let order = place_order(&customer, &product["id"], 2).await;
    let path = format!("/api/admin/orders/{}", order["id"]);
    assert_eq!(product_stock(&admin, &product["id"]).await, 3);

    let response = admin.put(&path, &json!({ "status": "cancelled" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(product_stock(&admin, &product["id"]).await, 5);

    // Repeating the same status is a no-op
    let response = admin.put(&path, &json!({ "status": "cancelled" })).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(product_stock(&admin, &product["id"]).await, 5);

    let response = admin.put(&path, &json!({ "status": "pending" })).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(product_stock(&admin, &product["id"]).await, 5);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_delivered_orders_are_final() {
    let admin = admin_client().await;
    let product = create_product(&admin, 5, &[]).await;

    let customer = TestClient::new();
    customer.register("Entregue").await;
    let order = place_order(&customer, &product["id"], 1).await;
    let path = format!("/api/admin/orders/{}", order["id"]);

    let response = admin
        .put(&path, &json!({ "status": "delivered", "tracking_code": "BR123456789" }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let delivered: Value = response.json().await.unwrap();
    assert_eq!(delivered["status"], "delivered");

    for status in ["shipped", "cancelled"] {
        let response = admin.put(&path, &json!({ "status": status })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{status}");
    }
    assert_eq!(product_stock(&admin, &product["id"]).await, 4);

    // Customers cannot cancel it either
    let response = customer
        .post(&format!("/api/orders/{}/cancel", order["id"]), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_demoted_admin_loses_order_access() {
    let (admin, email) = admin_account().await;
    let product = create_product(&admin, 5, &[]).await;

    let customer = TestClient::new();
    customer.register("Privado").await;
    let order = place_order(&customer, &product["id"], 1).await;
    let path = format!("/api/orders/{}", order["id"]);
    assert_eq!(admin.get(&path).await.status(), StatusCode::OK);

    // The session still claims the admin role
    set_role(&email, UserRole::User).await;
    assert_eq!(admin.get(&path).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        admin.get("/api/admin/dashboard").await.status(),
        StatusCode::FORBIDDEN
    );
}
