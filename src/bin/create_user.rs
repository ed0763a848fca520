use std::io::{self, Write};

use clap::Parser;
use sqlx::postgres::PgPoolOptions;

use medicine_api::auth::validation::{is_email, is_strong_password};
use medicine_api::auth::{CredentialHasher, Role, RoleSet};
use medicine_api::models::NewUser;
use medicine_api::store::migration::run_migrations;
use medicine_api::store::{PgUserStore, StoreError, UserStore};

#[derive(Parser, Debug)]
#[command(
    name = "create_user",
    about = "Create a user account directly in the user store"
)]
struct Args {
    /// Email address for the account (case insensitive).
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store for this user.
    #[arg(long)]
    password: String,

    /// Role to grant; repeat for several (`regular` or `admin`).
    #[arg(long = "role", default_value = "regular")]
    roles: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let email = args.email.trim().to_lowercase();

    if !is_email(&email) {
        writeln!(io::stderr(), "error: '{email}' is not a valid email address")?;
        std::process::exit(1);
    }
    if !is_strong_password(&args.password) {
        writeln!(
            io::stderr(),
            "error: password needs 8+ characters with lower, upper, digit and symbol"
        )?;
        std::process::exit(1);
    }

    let mut roles = RoleSet::new();
    for raw in &args.roles {
        match Role::parse(raw) {
            Some(role) => {
                roles.insert(role);
            }
            None => {
                writeln!(
                    io::stderr(),
                    "error: unsupported role '{raw}'. Use 'regular' or 'admin'."
                )?;
                std::process::exit(1);
            }
        }
    }

    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;
    run_migrations(&pool).await?;

    let hasher = CredentialHasher::new()?;
    let store = PgUserStore::new(pool);
    let created = store
        .create(NewUser {
            email: email.clone(),
            password_hash: hasher.hash(&args.password)?,
            roles: roles.clone(),
        })
        .await;

    match created {
        Ok(user) => {
            let names: Vec<String> = roles.iter().map(|role| role.to_string()).collect();
            println!(
                "Created user '{}' with id {} and roles [{}]",
                user.email,
                user.id,
                names.join(", ")
            );
            Ok(())
        }
        Err(StoreError::UniqueViolation(_)) => {
            writeln!(io::stderr(), "error: a user with email '{email}' already exists.")?;
            std::process::exit(1);
        }
        Err(err) => Err(err.into()),
    }
}
