//! The last-admin guard against a running server.
//!
//! Demotes every other admin in the database, so this file is its own test
//! binary and never runs alongside the other suites.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use vitrine_core::{Email, UserRole};
use vitrine_integration_tests::{admin_account, set_role, test_pool};
use vitrine_storefront::db::UserRepository;
use vitrine_storefront::db::users::{RoleChange, UserDeletion};

#[tokio::test]
#[ignore = "requires a running server and database"]
async fn test_last_admin_cannot_be_removed() {
    let (admin, email) = admin_account().await;
    let me: Value = admin.get("/api/auth/session").await.json().await.unwrap();

    let pool = test_pool().await;
    sqlx::query("UPDATE shop.user SET role = 'user' WHERE role = 'admin' AND email <> $1")
        .bind(&email)
        .execute(&pool)
        .await
        .unwrap();

    let response = admin
        .put(
            &format!("/api/admin/users/{}", me["id"]),
            &json!({ "role": "user" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Não é possível remover o último administrador");

    // Admins cannot delete themselves over HTTP, so the delete guard is
    // exercised on the repository directly
    let users = UserRepository::new(&pool);
    let user = users
        .get_by_email(&Email::parse(&email).unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(users.delete(user.id).await.unwrap(), UserDeletion::LastAdmin);
    assert!(matches!(
        users
            .update_by_admin(user.id, None, Some(UserRole::User))
            .await
            .unwrap(),
        RoleChange::LastAdmin
    ));

    // Renaming the last admin is still allowed
    let response = admin
        .put(
            &format!("/api/admin/users/{}", me["id"]),
            &json!({ "name": "Única Admin" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // With a second admin the first one can step down
    let (other, _) = admin_account().await;
    let response = other
        .put(
            &format!("/api/admin/users/{}", me["id"]),
            &json!({ "role": "user" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let demoted: Value = response.json().await.unwrap();
    assert_eq!(demoted["role"], "user");

    set_role(&email, UserRole::Admin).await;
}
