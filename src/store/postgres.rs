use rocket_db_pools::sqlx::{self, PgPool};

use crate::models::{NewUser, User, UserRow};
use crate::store::{StoreError, StoreResult, UserKey, UserStore, normalize_email};

const UNIQUE_VIOLATION: &str = "23505";

const USER_COLUMNS: &str = "id, email, password_hash, roles, created_at";

/// Postgres-backed [`UserStore`] over the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, roles) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(normalize_email(&user.email))
            .bind(&user.password_hash)
            .bind(user.roles.to_strings())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn find(&self, key: &UserKey) -> StoreResult<User> {
        let row: Option<UserRow> = match key {
            UserKey::Id(id) => {
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            UserKey::Email(email) => {
                sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                    .bind(normalize_email(email))
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        row.map(User::from).ok_or(StoreError::NotFound)
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete(&self, key: &UserKey) -> StoreResult<User> {
        let row: Option<UserRow> = match key {
            UserKey::Id(id) => {
                sqlx::query_as(&format!(
                    "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
                ))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            UserKey::Email(email) => {
                sqlx::query_as(&format!(
                    "DELETE FROM users WHERE email = $1 RETURNING {USER_COLUMNS}"
                ))
                .bind(normalize_email(email))
                .fetch_optional(&self.pool)
                .await?
            }
        };

        row.map(User::from).ok_or(StoreError::NotFound)
    }
}

fn map_write_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err)
            if db_err
                .code()
                .map(|code| code == UNIQUE_VIOLATION)
                .unwrap_or(false) =>
        {
            StoreError::UniqueViolation(
                db_err
                    .constraint()
                    .unwrap_or("users_email_key")
                    .to_string(),
            )
        }
        _ => StoreError::Database(err),
    }
}
