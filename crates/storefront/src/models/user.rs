//! User domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use vitrine_core::{Email, UserId, UserRole};

/// Optional contact and address details kept on the account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

/// A storefront account. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
    #[serde(flatten)]
    pub profile: UserProfile,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin user list filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserFilter {
    /// Matches name or email.
    pub search: Option<String>,
    pub role: Option<UserRole>,
}
