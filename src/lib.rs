#[macro_use]
extern crate rocket;

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod request_logger;
pub mod routes;
pub mod store;

use crate::auth::{AuthConfig, AuthState};
use crate::db::UsersDb;
use crate::request_logger::RequestLogger;
use crate::store::{PgUserStore, SharedUserStore};
use env_logger::Env;
use rocket::fairing::AdHoc;
use rocket::figment::Figment;
use rocket::http::Method;
use rocket::{Build, Rocket};
use rocket_cors::{AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use std::sync::{Arc, Once};

static LOGGER: Once = Once::new();

fn init_logger() {
    LOGGER.call_once(|| {
        env_logger::Builder::from_env(
            Env::default().default_filter_or("info,rocket::server=warn,rocket::request=warn"),
        )
        .init();
    });
}

/// Rocket figment, with `DATABASE_URL` overriding `databases.users_db.url` when set.
fn figment() -> Figment {
    let figment = rocket::Config::figment();
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => figment.merge(("databases.users_db.url", url)),
        _ => figment,
    }
}

pub fn rocket() -> Rocket<Build> {
    init_logger();

    let cors = CorsOptions::default()
        .allowed_origins(AllowedOrigins::all())
        .allowed_methods(
            vec![Method::Get, Method::Post, Method::Delete]
                .into_iter()
                .map(From::from)
                .collect(),
        )
        .allow_credentials(true)
        .to_cors()
        .expect("Error creating CORS");

    let rocket = rocket::custom(figment())
        .attach(RequestLogger)
        .attach(UsersDb::init())
        .attach(cors)
        .attach(AdHoc::try_on_ignite("Auth Configuration", |rocket| async move {
            match AuthConfig::from_env().and_then(AuthState::from_config) {
                Ok(state) => {
                    log::info!(
                        "token service ready (issuer {}, ttl {}s)",
                        state.config.issuer,
                        state.jwt_service.token_ttl().num_seconds()
                    );
                    Ok(rocket.manage(state))
                }
                Err(e) => {
                    log::error!("authentication setup failed: {}", e);
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Run Migrations", |rocket| async move {
            match UsersDb::fetch(&rocket) {
                Some(db) => match store::migration::run_migrations(&**db).await {
                    Ok(_) => Ok(rocket),
                    Err(e) => {
                        log::error!("database migrations failed: {}", e);
                        Err(rocket)
                    }
                },
                None => {
                    log::error!("database pool not available for migrations");
                    Err(rocket)
                }
            }
        }))
        .attach(AdHoc::try_on_ignite("Manage User Store", |rocket| async move {
            match UsersDb::fetch(&rocket) {
                Some(db) => {
                    let pool = (**db).clone();
                    let store: SharedUserStore = Arc::new(PgUserStore::new(pool));
                    Ok(rocket.manage(store))
                }
                None => Err(rocket),
            }
        }));

    mount_api(rocket)
}

/// Mount the API routes with their access policies and JSON error catchers.
///
/// The caller provides [`AuthState`] and a [`SharedUserStore`] as managed state.
pub fn mount_api(rocket: Rocket<Build>) -> Rocket<Build> {
    let api = routes::api_routes();
    let policies = routes::api_policies();

    for route in &api {
        if !policies.contains(route.method, route.uri.as_str()) {
            log::warn!(
                "{} {} has no access policy; authentication will be required",
                route.method,
                route.uri
            );
        }
    }

    rocket
        .mount("/", api)
        .register("/", catchers![error::default_catcher])
        .manage(policies)
}

#[cfg_attr(not(test), allow(dead_code))]
pub mod test_support {
    use std::sync::Arc;

    use rocket::config::LogLevel;
    use rocket::figment::Figment;
    use rocket::local::asynchronous::Client as AsyncClient;
    use rocket::{Build, Rocket};

    use crate::auth::jwt::Identity;
    use crate::auth::{AuthConfig, AuthState, CredentialHasher, RoleSet};
    use crate::models::{NewUser, User};
    use crate::store::{MemoryUserStore, SharedUserStore, StoreResult};

    pub use database::{TestDatabase, TestDatabaseError};

    pub const TEST_SECRET: &str = "test-secret-key";

    /// Builder for Rocket instances wired like production, minus Postgres.
    pub struct TestRocketBuilder {
        figment: Figment,
        auth_state: AuthState,
        store: SharedUserStore,
    }

    impl Default for TestRocketBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestRocketBuilder {
        /// Random port, logging off, in-memory store, one-day tokens.
        pub fn new() -> Self {
            let figment = rocket::Config::figment()
                .merge(("port", 0))
                .merge(("log_level", LogLevel::Off))
                .merge(("cli_colors", false));

            Self {
                figment,
                auth_state: AuthState::from_config(AuthConfig::with_secret(TEST_SECRET))
                    .expect("test auth state"),
                store: Arc::new(MemoryUserStore::new()),
            }
        }

        pub fn with_store(mut self, store: SharedUserStore) -> Self {
            self.store = store;
            self
        }

        pub fn with_auth_config(mut self, config: AuthConfig) -> Self {
            self.auth_state = AuthState::from_config(config).expect("test auth state");
            self
        }

        pub fn auth_state(&self) -> &AuthState {
            &self.auth_state
        }

        pub fn store(&self) -> SharedUserStore {
            self.store.clone()
        }

        /// Insert a user straight into the store, bypassing the HTTP layer.
        pub async fn insert_user(
            &self,
            email: &str,
            password: &str,
            roles: RoleSet,
        ) -> StoreResult<User> {
            let hasher = CredentialHasher::new().expect("credential hasher");
            self.store
                .create(NewUser {
                    email: email.to_string(),
                    password_hash: hasher.hash(password).expect("hash password"),
                    roles,
                })
                .await
        }

        /// `Authorization` header value carrying a freshly issued token.
        pub fn bearer_for(&self, identity: &Identity) -> String {
            let token = self
                .auth_state
                .jwt_service
                .issue(identity)
                .expect("issue test token");
            format!("Bearer {}", token.token)
        }

        pub fn build(self) -> Rocket<Build> {
            crate::mount_api(rocket::custom(self.figment))
                .manage(self.auth_state)
                .manage(self.store)
        }

        pub async fn async_client(self) -> AsyncClient {
            AsyncClient::tracked(self.build())
                .await
                .expect("valid Rocket instance")
        }
    }

    pub mod database {
        use log::LevelFilter;
        use rocket_db_pools::sqlx::postgres::{PgConnectOptions, PgPoolOptions};
        use rocket_db_pools::sqlx::{self, ConnectOptions, PgPool};
        use testcontainers::ImageExt;
        use testcontainers_modules::postgres::Postgres;
        use testcontainers_modules::testcontainers::{
            ContainerAsync, core::error::TestcontainersError, runners::AsyncRunner,
        };
        use thiserror::Error;
        use tokio::runtime::Handle;
        use uuid::Uuid;

        use crate::store::migration::MIGRATOR;

        #[derive(Debug, Error)]
        pub enum TestDatabaseError {
            #[error("neither TEST_DATABASE_URL nor TEST_DATABASE_CONTAINER is set")]
            MissingUrl,
            #[error("database error: {0}")]
            Sqlx(#[from] sqlx::Error),
            #[error("migration error: {0}")]
            Migration(#[from] sqlx::migrate::MigrateError),
            #[error("container error: {0}")]
            Container(#[from] TestcontainersError),
        }

        /// Throwaway database with the schema applied, dropped by [`TestDatabase::close`]
        /// or, best effort, when the value is dropped without closing.
        pub struct TestDatabase {
            pool: Option<PgPool>,
            admin_options: PgConnectOptions,
            database_name: String,
            container: Option<ContainerAsync<Postgres>>,
        }

        impl TestDatabase {
            /// Use the server at `TEST_DATABASE_URL`, or start a disposable Postgres
            /// container when `TEST_DATABASE_CONTAINER=1`.
            pub async fn new_from_env() -> Result<Self, TestDatabaseError> {
                if let Ok(url) = std::env::var("TEST_DATABASE_URL") {
                    let options: PgConnectOptions = url.parse()?;
                    return Self::provision(options.log_statements(LevelFilter::Off), None).await;
                }

                if std::env::var("TEST_DATABASE_CONTAINER").as_deref() == Ok("1") {
                    let container = Postgres::default().with_tag("16-alpine").start().await?;
                    let host = container.get_host().await?.to_string();
                    let port = container.get_host_port_ipv4(5432).await?;
                    let options = PgConnectOptions::new()
                        .host(&host)
                        .port(port)
                        .username("postgres")
                        .password("postgres")
                        .database("postgres")
                        .log_statements(LevelFilter::Off);
                    return Self::provision(options, Some(container)).await;
                }

                Err(TestDatabaseError::MissingUrl)
            }

            async fn provision(
                base_options: PgConnectOptions,
                container: Option<ContainerAsync<Postgres>>,
            ) -> Result<Self, TestDatabaseError> {
                let admin_options = base_options.clone();
                let admin_pool = PgPoolOptions::new()
                    .max_connections(1)
                    .connect_with(admin_options.clone())
                    .await?;

                let database_name = format!("medicine_test_{}", Uuid::new_v4().simple());
                sqlx::query(&format!("CREATE DATABASE \"{}\"", database_name))
                    .execute(&admin_pool)
                    .await?;
                admin_pool.close().await;

                let pool = PgPoolOptions::new()
                    .max_connections(5)
                    .connect_with(base_options.database(&database_name))
                    .await?;
                MIGRATOR.run(&pool).await?;

                Ok(Self {
                    pool: Some(pool),
                    admin_options,
                    database_name,
                    container,
                })
            }

            pub fn database_name(&self) -> &str {
                &self.database_name
            }

            pub fn pool_clone(&self) -> PgPool {
                self.pool
                    .clone()
                    .expect("test database pool is open until close()")
            }

            /// Close the pool and drop the database.
            pub async fn close(mut self) -> Result<(), TestDatabaseError> {
                if let Some(pool) = self.pool.take() {
                    pool.close().await;
                }
                drop_database(self.admin_options.clone(), &self.database_name).await
            }
        }

        async fn drop_database(
            admin_options: PgConnectOptions,
            database_name: &str,
        ) -> Result<(), TestDatabaseError> {
            let admin_pool = PgPoolOptions::new()
                .max_connections(1)
                .connect_with(admin_options)
                .await?;
            sqlx::query(&format!(
                "DROP DATABASE IF EXISTS \"{}\" WITH (FORCE)",
                database_name
            ))
            .execute(&admin_pool)
            .await?;
            admin_pool.close().await;
            Ok(())
        }

        impl Drop for TestDatabase {
            fn drop(&mut self) {
                // Only reached with a live pool when a test bailed out before close().
                if let Some(pool) = self.pool.take() {
                    let admin_options = self.admin_options.clone();
                    let database_name = self.database_name.clone();
                    let cleanup = async move {
                        pool.close().await;
                        if let Err(err) = drop_database(admin_options, &database_name).await {
                            log::warn!("failed to drop test database {}: {}", database_name, err);
                        }
                    };

                    match Handle::try_current() {
                        Ok(handle) => {
                            handle.spawn(cleanup);
                        }
                        Err(_) => {
                            std::thread::spawn(move || {
                                if let Ok(runtime) = tokio::runtime::Runtime::new() {
                                    runtime.block_on(cleanup);
                                }
                            });
                        }
                    }
                }

                drop(self.container.take());
            }
        }
    }
}
