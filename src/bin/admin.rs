//! CLI administration tool for encurta.
//!
//! Provides commands for inspecting and cleaning up links, preparing key
//! material and computing the login hash without going through the HTTP API.
//!
//! # Usage
//!
//! ```bash
//! # List all links
//! cargo run --bin admin -- links list
//!
//! # Delete links whose expiration day has passed
//! cargo run --bin admin -- links purge-expired
//!
//! # Create the RSA key pair used to sign tokens
//! cargo run --bin admin -- keys generate
//!
//! # Print the hash a client sends to POST /login
//! cargo run --bin admin -- login-hash --user admin
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `SQL_TYPE` and the backend block (`MYSQL_*` / `MSSQL_*`): for `links` and `db`
//! - `APP_CERT_PATH` (default `./certs`): for `keys`
//! - `APP_MASTER_USER`, `APP_MASTER_PASS`, `APP_SALT`: for `login-hash`

use encurta::config::DatabaseConfig;
use encurta::domain::entities::Link;
use encurta::domain::repositories::LinkRepository;
use encurta::infrastructure::database::{ConnectorOptions, DatabaseConnector};
use encurta::infrastructure::keys::{KeyPairStatus, RSA_KEY_BITS, ensure_key_pair};
use encurta::infrastructure::persistence::SqlLinkRepository;
use encurta::utils::hashing::login_hash;

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI tool for managing encurta.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and clean up links
    Links {
        #[command(subcommand)]
        action: LinksAction,
    },

    /// Manage the token signing keys
    Keys {
        #[command(subcommand)]
        action: KeysAction,
    },

    /// Print sha256(user + APP_MASTER_PASS + APP_SALT) for POST /login
    LoginHash {
        /// User name (defaults to APP_MASTER_USER)
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand)]
enum LinksAction {
    /// List all links
    List,

    /// Delete every link whose expiration day lies before today
    PurgeExpired {
        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum KeysAction {
    /// Create the RSA key pair if it does not exist yet
    Generate {
        /// Key directory (defaults to APP_CERT_PATH or ./certs)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Links { action } => handle_links_action(action).await?,
        Commands::Keys { action } => handle_keys_action(action)?,
        Commands::LoginHash { user } => print_login_hash(user)?,
        Commands::Db { action } => handle_db_action(action).await?,
    }

    Ok(())
}

/// Starts a connector from the environment without running the create script.
async fn connect() -> Result<Arc<DatabaseConnector>> {
    let database = DatabaseConfig::from_env().context("Failed to load database configuration")?;

    let connector = DatabaseConnector::from_settings(ConnectorOptions {
        create_script: None,
        ..database.connector_options()
    })?;

    connector
        .start()
        .await
        .with_context(|| format!("Failed to connect to {}", database.settings.describe()))?;

    Ok(Arc::new(connector))
}

/// Dispatches link commands.
async fn handle_links_action(action: LinksAction) -> Result<()> {
    let connector = connect().await?;
    let repo = SqlLinkRepository::new(connector.clone());

    let result = match action {
        LinksAction::List => list_links(&repo).await,
        LinksAction::PurgeExpired { yes } => purge_expired(&repo, yes).await,
    };

    connector.stop(false).await?;
    result
}

/// Lists all links with status indicators.
///
/// # Output Format
///
/// ```text
/// 📋 Links
///
///   ID    Code      Visits  Expires     Status   Name
///   ───────────────────────────────────────────────────────────────
///   1     aB3xZ     12      2030-12-31  ACTIVE   Example
///         https://example.com
/// ```
async fn list_links(repo: &SqlLinkRepository) -> Result<()> {
    println!("{}", "📋 Links".bright_blue().bold());
    println!();

    let links = repo
        .list()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list links: {}", e))?;

    if links.is_empty() {
        println!("{}", "  No links found".yellow());
        return Ok(());
    }

    println!(
        "  {:<5} {:<9} {:<7} {:<11} {:<8} {}",
        "ID".bright_white().bold(),
        "Code".bright_white().bold(),
        "Visits".bright_white().bold(),
        "Expires".bright_white().bold(),
        "Status".bright_white().bold(),
        "Name".bright_white().bold()
    );
    println!("  {}", "─".repeat(75).bright_black());

    for link in &links {
        print_link(link);
    }

    println!();
    println!("  Total: {}", links.len().to_string().bright_white().bold());
    println!();

    Ok(())
}

fn print_link(link: &Link) {
    let status = if link.is_expired() {
        "EXPIRED".red()
    } else {
        "ACTIVE".green()
    };

    let expires = link
        .expires_on
        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string());

    println!(
        "  {:<5} {:<9} {:<7} {:<11} {:<8} {}",
        link.id.to_string().bright_black(),
        link.code.cyan(),
        link.visits,
        expires.bright_black(),
        status,
        link.name
    );
    println!("  {:<5} {}", "", link.url.bright_black());
}

/// Deletes expired links after confirmation.
async fn purge_expired(repo: &SqlLinkRepository, skip_confirm: bool) -> Result<()> {
    println!("{}", "🧹 Purge Expired Links".bright_blue().bold());
    println!();
    println!(
        "  Links expiring before {} will be deleted.",
        Local::now().date_naive().format("%Y-%m-%d").to_string().cyan()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Delete expired links?")
            .default(false)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let removed = repo
        .delete_all_expired()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to delete expired links: {}", e))?;

    println!();
    println!(
        "{} {}",
        "✅ Deleted links:".green().bold(),
        removed.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Dispatches key commands.
fn handle_keys_action(action: KeysAction) -> Result<()> {
    match action {
        KeysAction::Generate { dir } => {
            let dir = dir
                .or_else(|| std::env::var("APP_CERT_PATH").ok().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from("./certs"));

            println!("{}", "🔑 RSA Key Pair".bright_blue().bold());
            println!();
            println!("  Directory: {}", dir.display().to_string().cyan());
            println!(
                "{}",
                format!("  Generating {RSA_KEY_BITS}-bit keys if missing, this can take a while...")
                    .bright_black()
            );

            let status = ensure_key_pair(&dir, RSA_KEY_BITS)
                .with_context(|| format!("Failed to prepare keys in {}", dir.display()))?;

            println!();
            match status {
                KeyPairStatus::Existing => {
                    println!("{}", "⚠️  Key pair already exists, nothing changed".yellow());
                }
                KeyPairStatus::Generated => {
                    println!("{}", "✅ Key pair generated".green().bold());
                }
                KeyPairStatus::PublicKeyDerived => {
                    println!(
                        "{}",
                        "✅ Public key derived from the existing private key"
                            .green()
                            .bold()
                    );
                }
            }
            println!();
        }
    }

    Ok(())
}

/// Prints the login hash for `user` or the master user.
fn print_login_hash(user: Option<String>) -> Result<()> {
    let password = std::env::var("APP_MASTER_PASS").context("APP_MASTER_PASS must be set")?;
    let salt = std::env::var("APP_SALT").context("APP_SALT must be set")?;

    let user = match user.or_else(|| std::env::var("APP_MASTER_USER").ok()) {
        Some(u) => u,
        None => Input::new().with_prompt("User").interact_text()?,
    };

    let hash = login_hash(&user, &password, &salt);

    println!("{}", "🔐 Login Hash".bright_blue().bold());
    println!();
    println!("  User: {}", user.cyan());
    println!("  Hash: {}", hash.bright_yellow().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -X POST -H \"Content-Type: application/json\" -d '{{\"user\":\"{}\",\"hash\":\"{}\"}}' http://localhost:3333/login",
        user, hash
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            let connector = connect().await?;
            let result = connector.execute_query("SELECT 1 AS ok", &[]).await;
            connector.stop(false).await?;
            result?;

            println!(
                "{} ({})",
                "✅ Database connection OK".green().bold(),
                connector.dialect()
            );
        }
    }

    Ok(())
}
