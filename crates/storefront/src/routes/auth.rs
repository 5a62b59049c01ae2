//! Authentication route handlers.
//!
//! Registration and login put a [`CurrentUser`] into the session; logout
//! flushes it.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use vitrine_core::UserRole;

use crate::db::UserRepository;
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::extract::ApiJson;
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User, session_keys};
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::validation::ValidationErrors;

/// Longest accepted display name.
pub const MAX_NAME_LENGTH: usize = 100;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and log it in.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let mut errors = ValidationErrors::new();
    let name = errors.required("name", &body.name, MAX_NAME_LENGTH);
    if body.email.trim().is_empty() {
        errors.add("email", "Campo obrigatório");
    }
    if body.password != body.confirm_password {
        errors.add("confirm_password", "As senhas não coincidem");
    }
    errors.finish()?;

    let user = AuthService::new(state.pool())
        .register(&name, &body.email, &body.password, UserRole::User)
        .await?;

    start_session(&session, &user).await?;
    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;

    start_session(&session, &user).await?;
    info!(user_id = %user.id, "User logged in");

    Ok(Json(user))
}

/// Log out, discarding the session.
#[instrument(skip_all)]
pub async fn logout(session: Session) -> Result<Json<serde_json::Value>> {
    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Json(serde_json::json!({ "message": "Sessão encerrada" })))
}

/// The logged-in user, read fresh from the database.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn session_user(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let Some(user) = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
    else {
        clear_current_user(&session).await?;
        return Err(AppError::Unauthorized("Sessão expirada".to_string()));
    };

    // Keep the session copy in line with name or role changes
    let fresh = CurrentUser::from(&user);
    if fresh != current {
        session
            .insert(session_keys::CURRENT_USER, &fresh)
            .await?;
    }

    Ok(Json(user))
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user)).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}
