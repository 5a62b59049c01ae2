//! User repository for database operations.
//!
//! Accounts, password hashes and the "at least one admin" rule.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use vitrine_core::{Email, Paginated, Pagination, UserId, UserRole};

use super::{RepositoryError, like_pattern};
use crate::models::user::{User, UserFilter, UserProfile};

const USER_COLUMNS: &str = "id, name, email, role, phone, address, city, state, zip_code, \
                            country, birth_date, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    name: String,
    email: String,
    role: UserRole,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: Option<String>,
    zip_code: Option<String>,
    country: Option<String>,
    birth_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name,
            email,
            role: row.role,
            profile: UserProfile {
                phone: row.phone,
                address: row.address,
                city: row.city,
                state: row.state,
                zip_code: row.zip_code,
                country: row.country,
                birth_date: row.birth_date,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Result of a guarded role change.
#[derive(Debug)]
pub enum RoleChange {
    Updated(User),
    NotFound,
    /// The change would leave the shop without any admin.
    LastAdmin,
}

/// Result of a guarded delete.
#[derive(Debug, PartialEq, Eq)]
pub enum UserDeletion {
    Deleted,
    NotFound,
    /// The user is the only remaining admin.
    LastAdmin,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a user together with their password hash, by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, CredentialRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM shop.user WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| Ok((User::try_from(r.user)?, r.password_hash)))
            .transpose()
    }

    /// Get the password hash of a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(&self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM shop.user WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(hash)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO shop.user (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique_violation(e, "email"))?;

        row.try_into()
    }

    /// Update name and profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        name: &str,
        profile: &UserProfile,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.user
            SET name = $2, phone = $3, address = $4, city = $5, state = $6,
                zip_code = $7, country = $8, birth_date = $9
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(&profile.phone)
        .bind(&profile.address)
        .bind(&profile.city)
        .bind(&profile.state)
        .bind(&profile.zip_code)
        .bind(&profile.country)
        .bind(profile.birth_date)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Replace a user's password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List users for the admin area, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &UserFilter,
        pagination: &Pagination,
    ) -> Result<Paginated<User>, RepositoryError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.user WHERE TRUE");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(self.pool).await?;

        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE TRUE"
        ));
        push_filters(&mut query, filter);
        query
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(pagination.sql_limit())
            .push(" OFFSET ")
            .push_bind(pagination.offset());

        let rows = query
            .build_query_as::<UserRow>()
            .fetch_all(self.pool)
            .await?;
        let users = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<Vec<User>, _>>()?;

        Ok(Paginated::new(users, pagination, total))
    }

    /// Rename a user and optionally change their role.
    ///
    /// Demoting the last admin is refused. For a demotion the admin rows are
    /// locked in id order before the target row, the same order `delete`
    /// uses, so concurrent demotions queue instead of deadlocking.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_by_admin(
        &self,
        id: UserId,
        name: Option<&str>,
        role: Option<UserRole>,
    ) -> Result<RoleChange, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let admins = if role == Some(UserRole::User) {
            lock_and_count_admins(&mut tx).await?
        } else {
            0
        };

        let current = sqlx::query_scalar::<_, UserRole>(
            "SELECT role FROM shop.user WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(current) = current else {
            return Ok(RoleChange::NotFound);
        };

        if removes_last_admin(current, role, admins) {
            return Ok(RoleChange::LastAdmin);
        }

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE shop.user
            SET name = COALESCE($2, name), role = COALESCE($3, role)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(name)
        .bind(role)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RoleChange::Updated(row.try_into()?))
    }

    /// Set the role of the account with the given email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has that email.
    pub async fn set_role_by_email(
        &self,
        email: &Email,
        role: UserRole,
    ) -> Result<User, RepositoryError> {
        let user = self
            .get_by_email(email)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        match self.update_by_admin(user.id, None, Some(role)).await? {
            RoleChange::Updated(user) => Ok(user),
            RoleChange::NotFound => Err(RepositoryError::NotFound),
            RoleChange::LastAdmin => Err(RepositoryError::Conflict(
                "cannot demote the last admin".to_owned(),
            )),
        }
    }

    /// Delete a user (cascades to cart and orders).
    ///
    /// Deleting the last admin is refused. Locks follow the order of
    /// `update_by_admin`: admin rows by id, then the target.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: UserId) -> Result<UserDeletion, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let admins = lock_and_count_admins(&mut tx).await?;

        let role = sqlx::query_scalar::<_, UserRole>(
            "SELECT role FROM shop.user WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(role) = role else {
            return Ok(UserDeletion::NotFound);
        };

        if removes_last_admin(role, None, admins) {
            return Ok(UserDeletion::LastAdmin);
        }

        sqlx::query("DELETE FROM shop.user WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(UserDeletion::Deleted)
    }

    /// Count accounts with the admin role.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_admins(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM shop.user WHERE role = 'admin'",
        )
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }
}

/// Lock every admin row in id order and count them.
async fn lock_and_count_admins(
    tx: &mut sqlx::Transaction<'_, Postgres>,
) -> Result<i64, RepositoryError> {
    let ids = sqlx::query_scalar::<_, i32>(
        "SELECT id FROM shop.user WHERE role = 'admin' ORDER BY id FOR UPDATE",
    )
    .fetch_all(&mut **tx)
    .await?;

    Ok(i64::try_from(ids.len()).unwrap_or(i64::MAX))
}

/// Whether taking `current` out of the admin role leaves no admin.
///
/// `new_role` of `None` means the account is being deleted.
const fn removes_last_admin(current: UserRole, new_role: Option<UserRole>, admins: i64) -> bool {
    let loses_admin = match new_role {
        Some(role) => !role.is_admin(),
        None => true,
    };
    current.is_admin() && loses_admin && admins <= 1
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &UserFilter) {
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(role) = filter.role {
        query.push(" AND role = ").push_bind(role);
    }
}
