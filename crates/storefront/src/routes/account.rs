//! Account route handlers: profile and password.

use axum::{Json, extract::State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::{info, instrument};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::middleware::RequireAuth;
use crate::models::{CurrentUser, User, UserProfile, session_keys};
use crate::routes::auth::MAX_NAME_LENGTH;
use crate::services::auth::AuthService;
use crate::state::AppState;
use crate::validation::{ValidationErrors, optional};

/// Profile update body. Blank optional fields clear the stored value.
#[derive(Deserialize)]
pub struct ProfileRequest {
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// Password change body.
#[derive(Deserialize)]
pub struct PasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: Option<String>,
}

/// The caller's account.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(current.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Usuário não encontrado".to_string()))?;
    Ok(Json(user))
}

/// Update name and profile fields.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(current): RequireAuth,
    ApiJson(body): ApiJson<ProfileRequest>,
) -> Result<Json<User>> {
    let (name, profile) = validate_profile(body, Utc::now().date_naive())?;

    let user = UserRepository::new(state.pool())
        .update_profile(current.id, &name, &profile)
        .await?;

    session
        .insert(session_keys::CURRENT_USER, CurrentUser::from(&user))
        .await?;
    info!("Profile updated");

    Ok(Json(user))
}

/// Change the caller's password.
#[instrument(skip_all, fields(user_id = %current.id))]
pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    ApiJson(body): ApiJson<PasswordRequest>,
) -> Result<Json<serde_json::Value>> {
    if body
        .confirm_password
        .as_deref()
        .is_some_and(|confirm| confirm != body.new_password)
    {
        let mut errors = ValidationErrors::new();
        errors.add("confirm_password", "As senhas não coincidem");
        return Err(errors.into());
    }

    AuthService::new(state.pool())
        .change_password(current.id, &body.current_password, &body.new_password)
        .await?;
    info!("Password changed");

    Ok(Json(serde_json::json!({ "message": "Senha alterada com sucesso" })))
}

fn validate_profile(
    body: ProfileRequest,
    today: NaiveDate,
) -> std::result::Result<(String, UserProfile), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let name = errors.required("name", &body.name, MAX_NAME_LENGTH);

    let state = optional(body.state).map(|s| errors.state("state", &s));
    let zip_code = optional(body.zip_code).map(|z| errors.cep("zip_code", &z));
    if body.birth_date.is_some_and(|d| d > today) {
        errors.add("birth_date", "Data de nascimento no futuro");
    }

    errors.finish()?;

    Ok((
        name,
        UserProfile {
            phone: optional(body.phone),
            address: optional(body.address),
            city: optional(body.city),
            state,
            zip_code,
            country: optional(body.country),
            birth_date: body.birth_date,
        },
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ProfileRequest {
        ProfileRequest {
            name: " Maria Silva ".to_string(),
            phone: Some(String::new()),
            address: Some("Rua Augusta".to_string()),
            city: Some("São Paulo".to_string()),
            state: Some("sp".to_string()),
            zip_code: Some("01305-000".to_string()),
            country: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    #[test]
    fn test_profile_is_normalized() {
        let (name, profile) = validate_profile(request(), today()).unwrap();
        assert_eq!(name, "Maria Silva");
        assert_eq!(profile.phone, None);
        assert_eq!(profile.state.as_deref(), Some("SP"));
        assert_eq!(profile.zip_code.as_deref(), Some("01305000"));
    }

    #[test]
    fn test_profile_rejects_future_birth_date_and_bad_cep() {
        let mut body = request();
        body.birth_date = NaiveDate::from_ymd_opt(2030, 1, 1);
        body.zip_code = Some("123".to_string());
        let errors = validate_profile(body, today()).unwrap_err();
        assert!(errors.get("birth_date").is_some());
        assert!(errors.get("zip_code").is_some());
    }
}
