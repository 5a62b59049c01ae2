//! Session middleware configuration.
//!
//! Sessions are stored server side (`PostgreSQL` in production, memory in
//! tests) and identified by a signed cookie.

use secrecy::ExposeSecret;
use tower_sessions::cookie::{Key, KeyError, SameSite, time::Duration};
use tower_sessions::service::SignedCookie;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "vitrine_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer for `store`.
///
/// The cookie is signed with the configured session secret, expires after
/// seven days of inactivity and is only sent over HTTPS when the base URL
/// is HTTPS.
///
/// # Errors
///
/// Returns `KeyError` if the session secret is too short to derive a key.
pub fn create_session_layer<S>(
    store: S,
    config: &StorefrontConfig,
) -> Result<SessionManagerLayer<S, SignedCookie>, KeyError>
where
    S: SessionStore + Clone,
{
    let key = Key::try_from(config.session_secret.expose_secret().as_bytes())?;

    Ok(SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(
            SESSION_EXPIRY_SECONDS,
        )))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
        .with_signed(key))
}
