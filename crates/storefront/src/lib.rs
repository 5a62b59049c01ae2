//! Vitrine Storefront library.
//!
//! JSON API for the shop, the blog and the admin area. The binary in
//! `main.rs` wires configuration, telemetry and the `PostgreSQL` session
//! store around [`app`]; tests build the same stack on an in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod validation;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tower_sessions::service::SignedCookie;
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::state::AppState;

/// Build the full application: routes, sessions and the middleware stack.
///
/// Layers from the outside in: Sentry, tracing, request ID, security
/// headers, session.
pub fn app<S>(state: AppState, session_layer: SessionManagerLayer<S, SignedCookie>) -> Router
where
    S: SessionStore + Clone,
{
    routes::routes(&state)
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode, header};
    use axum::routing::post;
    use http_body_util::BodyExt;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use vitrine_core::{Email, UserId, UserRole};

    use super::*;
    use crate::config::{LogFormat, StorefrontConfig};
    use crate::models::CurrentUser;

    fn test_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/vitrine_test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("k".repeat(64)),
            log_format: LogFormat::Pretty,
            low_stock_threshold: 5,
            trust_proxy_headers: false,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// The pool never connects; routes under test must not reach the database.
    fn test_state() -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/vitrine_test")
            .unwrap();
        AppState::new(test_config(), pool)
    }

    fn test_app() -> Router {
        let state = test_state();
        let session_layer = middleware::create_session_layer(MemoryStore::default(), state.config())
            .unwrap();
        app(state, session_layer)
    }

    /// Same stack plus a route that logs in a fixed customer without the
    /// database.
    fn app_with_customer_login() -> Router {
        async fn login_customer(session: Session) -> StatusCode {
            let user = CurrentUser {
                id: UserId::new(42),
                email: Email::parse("cliente@example.com").unwrap(),
                name: "Cliente".to_string(),
                role: UserRole::User,
            };
            middleware::set_current_user(&session, &user).await.unwrap();
            StatusCode::NO_CONTENT
        }

        let state = test_state();
        let session_layer = middleware::create_session_layer(MemoryStore::default(), state.config())
            .unwrap();
        routes::routes(&state)
            .route("/test/login", post(login_customer))
            .layer(session_layer)
            .with_state(state)
    }

    fn request(method: &str, uri: &str) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 50_000))))
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(request("GET", "/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_responses_carry_request_id_and_security_headers() {
        let response = test_app()
            .oneshot(
                request("GET", "/health")
                    .header("x-request-id", "req-123")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let headers = response.headers();
        assert_eq!(headers["x-request-id"], "req-123");
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
    }

    #[tokio::test]
    async fn test_cart_requires_login() {
        let response = test_app()
            .oneshot(request("GET", "/api/cart").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Faça login para continuar");
    }

    #[tokio::test]
    async fn test_admin_requires_login() {
        let response = test_app()
            .oneshot(
                request("GET", "/api/admin/dashboard")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_rejects_customers() {
        let app = app_with_customer_login();

        let response = app
            .clone()
            .oneshot(request("POST", "/test/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let cookie = response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();

        let response = app
            .oneshot(
                request("GET", "/api/admin/users")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Acesso restrito a administradores");
    }

    #[tokio::test]
    async fn test_login_rejects_malformed_body() {
        let response = test_app()
            .oneshot(
                request("POST", "/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email": "ana@example.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Corpo da requisição inválido");
    }

    #[tokio::test]
    async fn test_session_polling_is_not_auth_limited() {
        let app = test_app();
        for _ in 0..10 {
            let response = app
                .clone()
                .oneshot(request("GET", "/api/auth/session").body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_repeated_logins_get_json_429() {
        let app = test_app();
        let mut statuses = Vec::new();
        let mut last = None;
        for _ in 0..6 {
            let response = app
                .clone()
                .oneshot(
                    request("POST", "/api/auth/login")
                        .header(header::CONTENT_TYPE, "application/json")
                        .body(Body::from("{}"))
                        .unwrap(),
                )
                .await
                .unwrap();
            statuses.push(response.status());
            last = Some(response);
        }

        assert!(statuses.iter().take(5).all(|s| *s == StatusCode::BAD_REQUEST));
        let response = last.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Muitas requisições, tente novamente em instantes");
    }

    #[tokio::test]
    async fn test_invalid_path_id_is_not_found() {
        let response = test_app()
            .oneshot(
                request("GET", "/api/products/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = test_app()
            .oneshot(request("GET", "/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
