use rocket_db_pools::{Database, sqlx};

/// Connection pool for the user store, configured under `databases.users_db`.
#[derive(Database)]
#[database("users_db")]
pub struct UsersDb(sqlx::PgPool);
