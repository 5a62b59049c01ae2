//! Authentication middleware and extractors.
//!
//! The logged-in user lives in the session as a [`CurrentUser`]. Handlers
//! pull it out with [`RequireAuth`] or [`RequireAdmin`]; the admin router
//! is additionally wrapped in [`require_admin`], which re-checks the role
//! against the database.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use tower_sessions::Session;
use tracing::warn;

use crate::db::{RepositoryError, UserRepository};
use crate::error::AppError;
use crate::models::{CurrentUser, session_keys};
use crate::state::AppState;

/// Extractor that requires a logged-in user.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Olá, {}!", user.name)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        current_user(parts)
            .await
            .map(Self)
            .ok_or_else(unauthorized)
    }
}

/// Extractor that requires a logged-in admin.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = current_user(parts).await.ok_or_else(unauthorized)?;
        if !user.is_admin() {
            return Err(forbidden());
        }
        Ok(Self(user))
    }
}

async fn current_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<CurrentUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

fn unauthorized() -> AppError {
    AppError::Unauthorized("Faça login para continuar".to_string())
}

fn forbidden() -> AppError {
    AppError::Forbidden("Acesso restrito a administradores".to_string())
}

/// Middleware guarding the admin router.
///
/// The session only records the role at login time, so the role is read
/// again from the database: a demoted or deleted admin loses access
/// immediately.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    let user = match session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        Ok(Some(user)) => user,
        Ok(None) => return unauthorized().into_response(),
        Err(e) => return AppError::Internal(format!("session error: {e}")).into_response(),
    };

    if !user.is_admin() {
        warn!(user_id = %user.id, "Non-admin session tried to reach admin API");
        return forbidden().into_response();
    }

    match UserRepository::new(state.pool()).get_by_id(user.id).await {
        Ok(Some(fresh)) if fresh.role.is_admin() => next.run(request).await,
        Ok(Some(_)) => {
            warn!(user_id = %user.id, "Demoted admin session tried to reach admin API");
            forbidden().into_response()
        }
        Ok(None) => {
            // Account deleted while the session was alive
            if let Err(e) = session.flush().await {
                warn!(user_id = %user.id, error = %e, "Failed to flush session of deleted account");
            }
            unauthorized().into_response()
        }
        Err(e) => AppError::Database(e).into_response(),
    }
}

/// Whether the session user is an admin right now.
///
/// Sessions without the admin role are answered without touching the
/// database; admin sessions are checked against the stored role.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn has_admin_role(pool: &PgPool, user: &CurrentUser) -> Result<bool, RepositoryError> {
    if !user.is_admin() {
        return Ok(false);
    }

    let fresh = UserRepository::new(pool).get_by_id(user.id).await?;
    let is_admin = fresh.is_some_and(|u| u.role.is_admin());
    if !is_admin {
        warn!(user_id = %user.id, "Session claims admin role the account no longer has");
    }
    Ok(is_admin)
}

/// Helper to set the current user in the session.
///
/// The session ID is cycled first so a pre-login session ID cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Helper to clear the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sqlx::postgres::PgPoolOptions;
    use vitrine_core::{Email, UserId, UserRole};

    use super::*;

    fn session_user(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: UserId::new(7),
            email: Email::parse("ana@example.com").unwrap(),
            name: "Ana".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_customer_is_not_admin_without_database() {
        // Unreachable pool: any query would fail
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/nowhere")
            .unwrap();
        let is_admin = has_admin_role(&pool, &session_user(UserRole::User))
            .await
            .unwrap();
        assert!(!is_admin);
    }

    #[tokio::test]
    async fn test_admin_claim_is_checked_against_database() {
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://localhost:1/nowhere")
            .unwrap();
        // The claimed role alone is not enough; the lookup has to run
        assert!(
            has_admin_role(&pool, &session_user(UserRole::Admin))
                .await
                .is_err()
        );
    }
}
