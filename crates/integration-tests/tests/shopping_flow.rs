//! Cart and checkout against a running server.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use vitrine_integration_tests::{
    TestClient, admin_client, create_product, place_order, product_stock, shipping_address,
};

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_cart_requires_login() {
    let client = TestClient::new();
    let response = client.get("/api/cart").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_checkout_reserves_and_cancel_restores_stock() {
    let admin = admin_client().await;
    let product = create_product(&admin, 2, &["P", "M"]).await;
    let product_id = product["id"].as_i64().unwrap();

    let customer = TestClient::new();
    customer.register("Cliente").await;

    // Size is required when the product has sizes
    let response = customer
        .post("/api/cart/items", &json!({ "product_id": product_id }))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product_id, "quantity": 3, "size": "M" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product_id, "quantity": 2, "size": "M" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cart: Value = response.json().await.unwrap();
    assert_eq!(cart["item_count"], 2);

    let count: Value = customer.get("/api/cart/count").await.json().await.unwrap();
    assert_eq!(count["count"], 2);

    let response = customer
        .post(
            "/api/orders",
            &json!({ "shipping_address": shipping_address(), "payment_method": "pix" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let order: Value = response.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    assert_eq!(order["shipping_address"]["zip_code"], "01310100");
    assert_eq!(order["shipping_address"]["state"], "SP");
    let order_id = order["id"].as_i64().unwrap();

    let cart: Value = customer.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);

    let stocked: Value = admin
        .get(&format!("/api/admin/products/{product_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(stocked["stock"], 0);

    let response = customer
        .post(&format!("/api/orders/{order_id}/cancel"), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled: Value = response.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");

    let restocked: Value = admin
        .get(&format!("/api/admin/products/{product_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(restocked["stock"], 2);

    // Cancelled orders stay cancelled
    let response = customer
        .post(&format!("/api/orders/{order_id}/cancel"), &json!({}))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_checkout_with_empty_cart_fails() {
    let customer = TestClient::new();
    customer.register("Vazio").await;

    let response = customer
        .post(
            "/api/orders",
            &json!({ "shipping_address": shipping_address(), "payment_method": "boleto" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Seu carrinho está vazio");
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_orders_are_private() {
    let admin = admin_client().await;
    let product = create_product(&admin, 5, &[]).await;

    let owner = TestClient::new();
    owner.register("Dono").await;
    owner
        .post(
            "/api/cart/items",
            &json!({ "product_id": product["id"], "quantity": 1 }),
        )
        .await;
    let order: Value = owner
        .post(
            "/api/orders",
            &json!({ "shipping_address": shipping_address(), "payment_method": "credit_card" }),
        )
        .await
        .json()
        .await
        .unwrap();
    let path = format!("/api/orders/{}", order["id"]);

    let stranger = TestClient::new();
    stranger.register("Estranho").await;
    assert_eq!(stranger.get(&path).await.status(), StatusCode::NOT_FOUND);
    assert_eq!(owner.get(&path).await.status(), StatusCode::OK);
    assert_eq!(admin.get(&path).await.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_same_variant_merges_into_one_line() {
    let admin = admin_client().await;
    let product = create_product(&admin, 10, &["P", "M"]).await;

    let customer = TestClient::new();
    customer.register("Juntar").await;

    for (quantity, size) in [(2, "M"), (3, "M"), (1, "P")] {
        let response = customer
            .post(
                "/api/cart/items",
                &json!({ "product_id": product["id"], "quantity": quantity, "size": size }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let cart: Value = customer.get("/api/cart").await.json().await.unwrap();
    let items = cart["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    let medium = items.iter().find(|item| item["size"] == "M").unwrap();
    assert_eq!(medium["quantity"], 5);
    assert_eq!(cart["item_count"], 6);

    // Merging past the stock is refused and leaves the line alone
    let response = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product["id"], "quantity": 6, "size": "M" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let cart: Value = customer.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["item_count"], 6);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_merge_cannot_pass_line_limit() {
    let admin = admin_client().await;
    let product = create_product(&admin, 200, &[]).await;
    let body = json!({ "product_id": product["id"], "quantity": 60 });

    let customer = TestClient::new();
    customer.register("Atacado").await;

    let response = customer.post("/api/cart/items", &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = customer.post("/api/cart/items", &body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: Value = response.json().await.unwrap();
    assert!(error["error"].as_str().unwrap().contains("99"));

    let cart: Value = customer.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["items"][0]["quantity"], 60);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_quantity_zero_removes_line() {
    let admin = admin_client().await;
    let product = create_product(&admin, 5, &[]).await;

    let customer = TestClient::new();
    customer.register("Remover").await;
    let cart: Value = customer
        .post(
            "/api/cart/items",
            &json!({ "product_id": product["id"], "quantity": 2 }),
        )
        .await
        .json()
        .await
        .unwrap();
    let item_id = &cart["items"][0]["id"];

    let response = customer
        .put(&format!("/api/cart/items/{item_id}"), &json!({ "quantity": 0 }))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let cart: Value = customer.get("/api/cart").await.json().await.unwrap();
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    let count: Value = customer.get("/api/cart/count").await.json().await.unwrap();
    assert_eq!(count["count"], 0);
}

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_placed_order_reserves_stock() {
    let admin = admin_client().await;
    let product = create_product(&admin, 4, &[]).await;

    let customer = TestClient::new();
    customer.register("Reserva").await;
    let order = place_order(&customer, &product["id"], 3).await;
    assert_eq!(order["status"], "pending");
    assert_eq!(product_stock(&admin, &product["id"]).await, 1);
}
