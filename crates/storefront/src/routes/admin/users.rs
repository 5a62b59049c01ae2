//! Admin user management.

use axum::{Json, extract::State};
use serde::Deserialize;
use tracing::{info, instrument};

use vitrine_core::{Paginated, Pagination, UserId, UserRole};

use crate::db::UserRepository;
use crate::db::users::{RoleChange, UserDeletion};
use crate::error::{AppError, Result};
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::middleware::RequireAdmin;
use crate::models::{User, UserFilter};
use crate::routes::auth::MAX_NAME_LENGTH;
use crate::state::AppState;
use crate::validation::ValidationErrors;

use super::Deleted;

/// Admin edit body. Omitted fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub role: Option<UserRole>,
}

/// List accounts.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<UserFilter>,
    ApiQuery(pagination): ApiQuery<Pagination>,
) -> Result<Json<Paginated<User>>> {
    let page = UserRepository::new(state.pool())
        .list(&filter, &pagination)
        .await?;
    Ok(Json(page))
}

/// One account.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<User>> {
    UserRepository::new(state.pool())
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(user_not_found)
}

/// Rename an account or change its role.
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
    ApiJson(body): ApiJson<UpdateUserRequest>,
) -> Result<Json<User>> {
    let mut errors = ValidationErrors::new();
    let name = body
        .name
        .map(|name| errors.required("name", &name, MAX_NAME_LENGTH));
    errors.finish()?;

    match UserRepository::new(state.pool())
        .update_by_admin(id, name.as_deref(), body.role)
        .await?
    {
        RoleChange::Updated(user) => {
            info!(role = %user.role, "User updated by admin");
            Ok(Json(user))
        }
        RoleChange::NotFound => Err(user_not_found()),
        RoleChange::LastAdmin => Err(AppError::BadRequest(
            "Não é possível remover o último administrador".to_string(),
        )),
    }
}

/// Delete an account. Admins cannot delete themselves or the last admin.
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiPath(id): ApiPath<UserId>,
) -> Result<Json<Deleted>> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "Você não pode excluir sua própria conta".to_string(),
        ));
    }

    match UserRepository::new(state.pool()).delete(id).await? {
        UserDeletion::Deleted => {
            info!("User deleted by admin");
            Ok(Json(Deleted {
                message: "Usuário excluído",
            }))
        }
        UserDeletion::NotFound => Err(user_not_found()),
        UserDeletion::LastAdmin => Err(AppError::BadRequest(
            "Não é possível excluir o último administrador".to_string(),
        )),
    }
}

fn user_not_found() -> AppError {
    AppError::NotFound("Usuário não encontrado".to_string())
}
