//! User persistence behind a small create/find/list/delete-by-unique-key trait.
//!
//! Email uniqueness is the store's responsibility: `create` reports a
//! duplicate as [`StoreError::UniqueViolation`] atomically, so callers never
//! need a separate existence check before inserting.

use std::sync::Arc;

use thiserror::Error;

use crate::models::{NewUser, User};

pub mod memory;
pub mod migration;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store handle kept in Rocket managed state.
pub type SharedUserStore = Arc<dyn UserStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Unique keys a user can be addressed by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKey {
    Id(i32),
    Email(String),
}

#[rocket::async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    /// Fails with [`StoreError::NotFound`] when nothing matches `key`.
    async fn find(&self, key: &UserKey) -> StoreResult<User>;

    async fn list(&self) -> StoreResult<Vec<User>>;

    /// Fails with [`StoreError::NotFound`] when nothing matches `key`.
    async fn delete(&self, key: &UserKey) -> StoreResult<User>;
}

/// Canonical form for stored and looked-up emails.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
