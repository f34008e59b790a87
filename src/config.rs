//! Application configuration loaded from environment variables.
//!
//! Configuration is loaded once at startup and validated before the server starts.
//!
//! ## Database
//!
//! `SQL_TYPE` selects the backend (`mysql`, `sqlserver` or `mssql`). Each backend
//! reads its own block of variables:
//!
//! ```bash
//! export SQL_TYPE="mysql"
//! export MYSQL_HOST="localhost"
//! export MYSQL_PORT="3306"
//! export MYSQL_USER="root"
//! export MYSQL_PASSWORD="password"      # optional
//! export MYSQL_DATABASE="encurta"
//! export MYSQL_TABLE="link"             # default: link
//! export MYSQL_CREATE_SCRIPT="sql/mysql/create.sql"
//! ```
//!
//! ```bash
//! export SQL_TYPE="sqlserver"
//! export MSSQL_HOST="localhost"
//! export MSSQL_PORT="1433"              # default: 1433
//! export MSSQL_USER="sa"
//! export MSSQL_PASSWORD="password"
//! export MSSQL_DATABASE="encurta"
//! export MSSQL_TABLE="link"             # default: link
//! export MSSQL_TRUST_CERT="true"        # default: false
//! export MSSQL_CREATE_SCRIPT="sql/sqlserver/create.sql"
//! ```
//!
//! ## Required Variables
//!
//! - `DOMAIN` - Prefix of generated short URLs, e.g. `https://s.example.com/`
//! - `SQL_TYPE` and the backend block above
//! - `APP_MASTER_USER`, `APP_MASTER_PASS`, `APP_SALT` - Login challenge secret
//!
//! ## Optional Variables
//!
//! - `LISTEN` - Bind address (default: `0.0.0.0:3333`)
//! - `RUST_LOG` - Log level (default: `info`)
//! - `LOG_FORMAT` - Log format: `text` or `json` (default: `text`)
//! - `CODE_LENGTH` - Length of generated codes (default: 5). The misspelled
//!   `CODE_LENGHT` used by older deployments is read when `CODE_LENGTH` is unset.
//! - `SQL_CREATE` - Run the backend's create script at startup (default: false)
//! - `SQL_LOGS` - Log every statement at `info` (default: false)
//! - `SHOW_CONFIG` - Log the configuration summary at startup (default: false)
//! - `APP_CERT_PATH` - Directory of the RSA key pair (default: `./certs`)
//! - `TOKEN_EXPIRES_IN` - Token lifetime in seconds (default: 3600)
//! - `VISIT_QUEUE_CAPACITY` - Visit event buffer size (default: 10000, min: 100)

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::infrastructure::database::{
    ConnectionSettings, ConnectorOptions, MySqlSettings, SqlDialect, SqlServerSettings,
};

const DEFAULT_TABLE: &str = "link";
const DEFAULT_MSSQL_PORT: u16 = 1433;
const CODE_LENGTH_VARS: [&str; 2] = ["CODE_LENGTH", "CODE_LENGHT"];

/// Database section of the configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub settings: ConnectionSettings,
    pub table: String,
    pub create_script: Option<PathBuf>,
    /// Run `create_script` at startup (`SQL_CREATE`).
    pub create_schema: bool,
    /// Log statements at `info` (`SQL_LOGS`).
    pub verbose: bool,
}

impl DatabaseConfig {
    /// Loads the block of variables for the backend named by `SQL_TYPE`.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQL_TYPE` is missing or unknown, a required
    /// variable of that backend is missing or invalid, or the table name is
    /// not a plain SQL identifier.
    pub fn from_env() -> Result<Self> {
        let dialect: SqlDialect = required("SQL_TYPE")?.parse()?;

        let (settings, table, create_script) = match dialect {
            SqlDialect::MySql => (
                ConnectionSettings::MySql(MySqlSettings {
                    host: required("MYSQL_HOST")?,
                    port: required("MYSQL_PORT")?
                        .trim()
                        .parse()
                        .context("MYSQL_PORT must be a port number")?,
                    user: required("MYSQL_USER")?,
                    password: env::var("MYSQL_PASSWORD").ok(),
                    database: required("MYSQL_DATABASE")?,
                }),
                env::var("MYSQL_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
                optional_path("MYSQL_CREATE_SCRIPT"),
            ),
            SqlDialect::SqlServer => (
                ConnectionSettings::SqlServer(SqlServerSettings {
                    host: required("MSSQL_HOST")?,
                    port: parse_or("MSSQL_PORT", DEFAULT_MSSQL_PORT)?,
                    user: required("MSSQL_USER")?,
                    password: required("MSSQL_PASSWORD")?,
                    database: required("MSSQL_DATABASE")?,
                    trust_server_certificate: flag("MSSQL_TRUST_CERT"),
                }),
                env::var("MSSQL_TABLE").unwrap_or_else(|_| DEFAULT_TABLE.to_string()),
                optional_path("MSSQL_CREATE_SCRIPT"),
            ),
        };

        let database = Self {
            settings,
            table,
            create_script,
            create_schema: flag("SQL_CREATE"),
            verbose: flag("SQL_LOGS"),
        };
        database.validate()?;
        Ok(database)
    }

    /// Checks the table name, which is formatted into every statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is not a plain SQL identifier.
    pub fn validate(&self) -> Result<()> {
        if !is_sql_identifier(&self.table) {
            anyhow::bail!(
                "Table name must be a plain SQL identifier, got '{}'",
                self.table
            );
        }
        Ok(())
    }

    pub fn dialect(&self) -> SqlDialect {
        self.settings.dialect()
    }

    /// Options for building the connector; the script is only passed on when
    /// schema creation is enabled.
    pub fn connector_options(&self) -> ConnectorOptions {
        ConnectorOptions {
            settings: self.settings.clone(),
            table: self.table.clone(),
            create_script: self
                .create_script
                .clone()
                .filter(|_| self.create_schema),
            verbose: self.verbose,
        }
    }
}

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub log_level: String,
    pub log_format: String,
    /// Prefix of every short URL.
    pub domain: String,
    pub code_length: usize,
    pub database: DatabaseConfig,
    pub show_config: bool,
    pub master_user: String,
    pub master_password: String,
    pub salt: String,
    /// Directory holding `api_key.pem` and `api_key_public.pem`.
    pub cert_path: PathBuf,
    pub token_expires_in: i64,
    pub visit_queue_capacity: usize,
}

fn required(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("{name} must be set"))
}

fn flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{name} has an invalid value '{v}'")),
        Err(_) => Ok(default),
    }
}

fn optional_path(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot
    /// be parsed.
    pub fn from_env() -> Result<Self> {
        let listen_addr = env::var("LISTEN").unwrap_or_else(|_| "0.0.0.0:3333".to_string());
        let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

        let domain = required("DOMAIN")?;
        let code_length_var = CODE_LENGTH_VARS
            .into_iter()
            .find(|name| env::var(name).is_ok())
            .unwrap_or(CODE_LENGTH_VARS[0]);
        let code_length = parse_or(code_length_var, 5usize)?;

        let database =
            DatabaseConfig::from_env().context("Failed to load database configuration")?;

        let master_user = required("APP_MASTER_USER")?;
        let master_password = required("APP_MASTER_PASS")?;
        let salt = required("APP_SALT")?;

        let cert_path = optional_path("APP_CERT_PATH").unwrap_or_else(|| PathBuf::from("./certs"));
        let token_expires_in = parse_or("TOKEN_EXPIRES_IN", 3600i64)?;
        let visit_queue_capacity = parse_or("VISIT_QUEUE_CAPACITY", 10_000usize)?;

        Ok(Self {
            listen_addr,
            log_level,
            log_format,
            domain,
            code_length,
            database,
            show_config: flag("SHOW_CONFIG"),
            master_user,
            master_password,
            salt,
            cert_path,
            token_expires_in,
            visit_queue_capacity,
        })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `visit_queue_capacity` is outside 100..=1000000
    /// - `code_length` is outside 1..=64
    /// - `log_format` is not `text` or `json`
    /// - `listen_addr` is invalid
    /// - the table name is not a plain SQL identifier
    /// - `SQL_CREATE` is set without a create script
    /// - a secret is empty or the token lifetime is not positive
    pub fn validate(&self) -> Result<()> {
        if self.visit_queue_capacity < 100 {
            anyhow::bail!(
                "VISIT_QUEUE_CAPACITY must be at least 100, got {}",
                self.visit_queue_capacity
            );
        }

        if self.visit_queue_capacity > 1_000_000 {
            anyhow::bail!(
                "VISIT_QUEUE_CAPACITY is too large (max: 1000000), got {}",
                self.visit_queue_capacity
            );
        }

        if !(1..=64).contains(&self.code_length) {
            anyhow::bail!(
                "CODE_LENGTH must be between 1 and 64, got {}",
                self.code_length
            );
        }

        if self.log_format != "text" && self.log_format != "json" {
            anyhow::bail!(
                "LOG_FORMAT must be 'text' or 'json', got '{}'",
                self.log_format
            );
        }

        if !self.listen_addr.contains(':') {
            anyhow::bail!(
                "LISTEN must be in format 'host:port', got '{}'",
                self.listen_addr
            );
        }

        if self.domain.trim().is_empty() {
            anyhow::bail!("DOMAIN must not be empty");
        }

        self.database.validate()?;

        if self.database.create_schema && self.database.create_script.is_none() {
            anyhow::bail!(
                "SQL_CREATE is enabled but no create script is configured for {}",
                self.database.dialect()
            );
        }

        if self.master_user.is_empty() || self.master_password.is_empty() || self.salt.is_empty() {
            anyhow::bail!("APP_MASTER_USER, APP_MASTER_PASS and APP_SALT must not be empty");
        }

        if self.token_expires_in <= 0 {
            anyhow::bail!(
                "TOKEN_EXPIRES_IN must be greater than 0, got {}",
                self.token_expires_in
            );
        }

        Ok(())
    }

    /// Prints configuration summary (without sensitive data).
    pub fn print_summary(&self) {
        tracing::info!("Configuration loaded:");
        tracing::info!("  Listen address: {}", self.listen_addr);
        tracing::info!("  Domain: {}", self.domain);
        tracing::info!("  Code length: {}", self.code_length);
        tracing::info!("  Database: {}", self.database.settings.describe());
        tracing::info!("  Table: {}", self.database.table);
        tracing::info!(
            "  Schema script: {}",
            self.database
                .create_script
                .as_ref()
                .filter(|_| self.database.create_schema)
                .map_or_else(|| "disabled".to_string(), |p| p.display().to_string())
        );
        tracing::info!("  SQL logs: {}", self.database.verbose);
        tracing::info!("  Key directory: {}", self.cert_path.display());
        tracing::info!("  Token lifetime: {}s", self.token_expires_in);
        tracing::info!("  Log level: {}", self.log_level);
        tracing::info!("  Log format: {}", self.log_format);
        tracing::info!("  Visit queue capacity: {}", self.visit_queue_capacity);
    }
}

/// Accepts `name` or `schema.name`, each part `[A-Za-z_][A-Za-z0-9_]*`.
fn is_sql_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

/// Loads and validates configuration from environment variables.
///
/// # Errors
///
/// Returns an error if required variables are missing or validation fails.
///
/// # Note
///
/// This function expects environment variables to be already loaded
/// (e.g., via `dotenvy::dotenv()` in `main.rs`).
pub fn load_from_env() -> Result<Config> {
    let config = Config::from_env()?;
    config.validate()?;
    Ok(config)
}
