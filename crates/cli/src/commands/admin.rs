//! Admin account commands.
//!
//! The first admin has to be created here: the API only lets admins grant
//! the role.

use vitrine_core::{Email, UserRole};
use vitrine_storefront::db::{RepositoryError, UserRepository};
use vitrine_storefront::services::auth::{AuthError, AuthService};

use super::ConnectError;

/// Errors that can occur during admin operations.
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Empty display name.
    #[error("Name cannot be empty")]
    EmptyName,

    /// No account with that email.
    #[error("No account found with email: {0}")]
    UserNotFound(String),

    /// Registration failed (duplicate email, weak password, ...).
    #[error("Could not create account: {0}")]
    Auth(#[from] AuthError),

    /// Database error.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Create a new admin account.
///
/// # Errors
///
/// Returns `AdminError` if the input is invalid, the email is taken or the
/// database fails.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<(), AdminError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AdminError::EmptyName);
    }
    Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;

    tracing::info!("Creating admin account: {}", email);
    let user = AuthService::new(&pool)
        .register(name, email, password, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin account created! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(())
}

/// Grant the admin role to an existing account.
///
/// # Errors
///
/// Returns `AdminError` if the email is invalid, no account matches or the
/// database fails.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let parsed = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;

    let pool = super::connect().await?;

    let user = UserRepository::new(&pool)
        .set_role_by_email(&parsed, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AdminError::UserNotFound(email.to_owned()),
            other => other.into(),
        })?;

    tracing::info!("{} ({}) is now an admin", user.name, user.email);
    Ok(())
}
