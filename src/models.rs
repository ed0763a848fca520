use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use serde::{Deserialize, Serialize};

use crate::auth::roles::RoleSet;

/// Persisted user account, including the credential hash.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub roles: RoleSet,
}

/// Row shape of the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: i32,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            roles: RoleSet::from_strings(&row.roles),
            created_at: row.created_at,
        }
    }
}

/// User as exposed over HTTP. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub roles: RoleSet,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roles: user.roles,
            created_at: user.created_at,
        }
    }
}
