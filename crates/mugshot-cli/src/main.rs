//! Mugshot CLI — operator tool for users and sessions.
//!
//! Connects straight to Postgres; set DATABASE_URL (a .env file is honored).

use anyhow::Context;
use clap::{Parser, Subcommand};
use mugshot_cli::{init_tracing, parse_user_ref, UserRef};
use mugshot_core::models::User;
use mugshot_core::UserStore;
use mugshot_db::{SessionRepository, UserRepository};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mugshot", about = "Mugshot operator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// User operations
    User {
        #[command(subcommand)]
        sub: UserCommands,
    },
    /// Session operations
    Session {
        #[command(subcommand)]
        sub: SessionCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user
    Create {
        /// Email address
        email: String,
        /// Initial profile image path (defaults to the configured default avatar)
        #[arg(long)]
        image: Option<String>,
    },
    /// Show a user
    Show {
        /// User UUID or email
        user: String,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Mint a session token for a user
    Create {
        /// User UUID or email
        user: String,
        /// Session lifetime in hours
        #[arg(long, default_value = "24")]
        ttl_hours: i64,
    },
    /// Revoke a session token
    Revoke {
        /// Session token
        token: String,
    },
    /// Delete expired sessions
    Prune,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

async fn resolve_user(users: &UserRepository, reference: &str) -> anyhow::Result<User> {
    let found = match parse_user_ref(reference) {
        UserRef::Id(id) => users.find_by_id(id).await?,
        UserRef::Email(email) => users.find_by_email(&email).await?,
    };
    found.with_context(|| format!("No user matching '{}'", reference))
}

fn default_profile_image() -> String {
    std::env::var("AVATAR_DEFAULT_IMAGE")
        .unwrap_or_else(|_| "/media/defaults/avatar.svg".to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    // Lazy pool: connections are dialed on first use, not here
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect_lazy(&database_url)
        .context("Failed to configure database pool")?;

    let users = UserRepository::new(pool.clone());
    let sessions = SessionRepository::new(pool);

    let cli = Cli::parse();

    match cli.command {
        Commands::User { sub } => match sub {
            UserCommands::Create { email, image } => {
                let profile_image = image.unwrap_or_else(default_profile_image);
                let user = users.create(&email, &profile_image).await?;
                print_json(&user)?;
            }
            UserCommands::Show { user } => {
                let user = resolve_user(&users, &user).await?;
                print_json(&user)?;
            }
        },
        Commands::Session { sub } => match sub {
            SessionCommands::Create { user, ttl_hours } => {
                let user = resolve_user(&users, &user).await?;
                let session = sessions.create(user.id, ttl_hours).await?;
                print_json(&session)?;
            }
            SessionCommands::Revoke { token } => {
                let revoked = sessions.revoke(&token).await?;
                print_json(&serde_json::json!({ "revoked": revoked }))?;
            }
            SessionCommands::Prune => {
                let pruned = sessions.prune_expired().await?;
                print_json(&serde_json::json!({ "pruned": pruned }))?;
            }
        },
    }

    Ok(())
}
