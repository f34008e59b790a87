//! Database connector unifying MySQL and SQL Server behind one query API.
//!
//! The persistence layer writes portable SQL with positional `?` placeholders
//! and calls [`DatabaseConnector::execute_query`]. The active backend decides how
//! the statement reaches the server:
//!
//! | Backend | Driver | Placeholders | Connection model |
//! |---------|--------|--------------|------------------|
//! | MySQL | `sqlx` | native `?` | shared pool |
//! | SQL Server | `tiberius` | rewritten to `@paramN` | one connection per query |
//!
//! Results always come back as a [`QueryResult`] of `column -> value` rows,
//! whatever shape the driver produced.

pub mod error;
pub mod mysql;
pub mod placeholders;
pub mod sqlserver;
pub mod value;

pub use error::ConnectorError;
pub use mysql::MySqlConnection;
pub use sqlserver::SqlServerConnection;
pub use value::{QueryResult, Row, SqlValue};

use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, error, info};

use crate::infrastructure::database::value::params_to_string;

/// SQL backend in use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    MySql,
    SqlServer,
}

impl SqlDialect {
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::MySql => "MySQL",
            SqlDialect::SqlServer => "SQLServer",
        }
    }

    /// Case-sensitive `codigo = ?` filter.
    ///
    /// Both backends compare strings case-insensitively by default, which would
    /// match `AbCde` against `abcde`.
    pub fn code_filter(&self) -> &'static str {
        match self {
            SqlDialect::MySql => "BINARY codigo = ?",
            SqlDialect::SqlServer => "codigo = ? COLLATE SQL_Latin1_General_CP1_CS_AS",
        }
    }

    /// Expression evaluating to today's date on the server.
    pub fn current_date(&self) -> &'static str {
        match self {
            SqlDialect::MySql => "CURDATE()",
            SqlDialect::SqlServer => "CAST(GETDATE() AS DATE)",
        }
    }

    /// Statement appended to an INSERT to read back the generated id, if the
    /// backend does not report it on its own.
    pub fn insert_id_suffix(&self) -> Option<&'static str> {
        match self {
            SqlDialect::MySql => None,
            SqlDialect::SqlServer => Some("; SELECT CAST(SCOPE_IDENTITY() AS BIGINT) AS id"),
        }
    }

    /// Statement appended to a DML statement to read back the affected row count.
    pub fn rows_affected_suffix(&self) -> Option<&'static str> {
        match self {
            SqlDialect::MySql => None,
            SqlDialect::SqlServer => Some("; SELECT CAST(@@ROWCOUNT AS BIGINT) AS affected"),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SqlDialect {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" => Ok(SqlDialect::MySql),
            "sqlserver" | "mssql" => Ok(SqlDialect::SqlServer),
            other => Err(ConnectorError::Config(format!(
                "unknown SQL type '{other}', expected 'mysql', 'sqlserver' or 'mssql'"
            ))),
        }
    }
}

/// Connection settings for the MySQL backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
}

/// Connection settings for the SQL Server backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlServerSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub trust_server_certificate: bool,
}

/// Backend-specific settings passed to [`DatabaseConnection::configure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionSettings {
    MySql(MySqlSettings),
    SqlServer(SqlServerSettings),
}

impl ConnectionSettings {
    pub fn dialect(&self) -> SqlDialect {
        match self {
            ConnectionSettings::MySql(_) => SqlDialect::MySql,
            ConnectionSettings::SqlServer(_) => SqlDialect::SqlServer,
        }
    }

    /// One-line description without the password.
    pub fn describe(&self) -> String {
        match self {
            ConnectionSettings::MySql(s) => {
                format!("mysql://{}:***@{}:{}/{}", s.user, s.host, s.port, s.database)
            }
            ConnectionSettings::SqlServer(s) => format!(
                "sqlserver://{}:***@{}:{}/{} (trust_cert={})",
                s.user, s.host, s.port, s.database, s.trust_server_certificate
            ),
        }
    }
}

/// A connection to one SQL backend.
///
/// # Implementations
///
/// - [`MySqlConnection`] - `sqlx` pool, native `?` placeholders
/// - [`SqlServerConnection`] - `tiberius`, named parameters, connection per query
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    fn dialect(&self) -> SqlDialect;

    /// Stores connection settings. Never connects.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Config`] if the settings belong to another backend.
    fn configure(&mut self, settings: ConnectionSettings) -> Result<(), ConnectorError>;

    /// Establishes connectivity using the configured settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Connection`] if the server cannot be reached.
    /// Callers treat this as fatal during startup.
    async fn start(&self, verbose: bool) -> Result<(), ConnectorError>;

    /// Closes the backend. Unless `immediate`, waits for in-flight queries.
    async fn stop(&self, immediate: bool) -> Result<(), ConnectorError>;

    /// Runs one statement with positional `?` parameters.
    async fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, ConnectorError>;
}

/// Runtime settings for [`DatabaseConnector::from_settings`].
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub settings: ConnectionSettings,
    pub table: String,
    /// DDL script run once after connecting, when schema creation is enabled.
    pub create_script: Option<PathBuf>,
    /// Logs connection lifecycle and statements at `info` instead of `debug`.
    pub verbose: bool,
}

/// The connector used by the rest of the application.
///
/// Wraps the backend chosen at startup together with its dialect and the name
/// of the link table.
pub struct DatabaseConnector {
    connection: Box<dyn DatabaseConnection>,
    dialect: SqlDialect,
    table: String,
    create_script: Option<PathBuf>,
    verbose: bool,
}

impl DatabaseConnector {
    /// Wraps an already configured backend.
    pub fn new(connection: Box<dyn DatabaseConnection>, table: impl Into<String>) -> Self {
        let dialect = connection.dialect();
        Self {
            connection,
            dialect,
            table: table.into(),
            create_script: None,
            verbose: false,
        }
    }

    /// Builds and configures the backend matching `options.settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectorError::Config`] if the backend rejects the settings.
    pub fn from_settings(options: ConnectorOptions) -> Result<Self, ConnectorError> {
        let mut connection: Box<dyn DatabaseConnection> = match options.settings.dialect() {
            SqlDialect::MySql => Box::new(MySqlConnection::new()),
            SqlDialect::SqlServer => Box::new(SqlServerConnection::new()),
        };
        connection.configure(options.settings)?;

        let mut connector = Self::new(connection, options.table);
        connector.create_script = options.create_script;
        connector.verbose = options.verbose;
        Ok(connector)
    }

    pub fn dialect(&self) -> SqlDialect {
        self.dialect
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Connects, then runs the schema script if one is configured.
    ///
    /// # Errors
    ///
    /// Returns the backend's connection error, or [`ConnectorError::Script`]
    /// if the script file cannot be read. A script that fails on the server is
    /// logged and does not abort startup.
    pub async fn start(&self) -> Result<(), ConnectorError> {
        self.connection.start(self.verbose).await?;
        info!(dialect = %self.dialect, table = %self.table, "Database connection established");

        if let Some(path) = &self.create_script {
            let script =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConnectorError::Script {
                        path: path.display().to_string(),
                        source,
                    })?;

            info!(path = %path.display(), "Running schema script");
            if let Err(e) = self.connection.execute_query(&script, &[]).await {
                error!(error = %e, path = %path.display(), "Schema script failed");
            }
        }

        Ok(())
    }

    pub async fn stop(&self, immediate: bool) -> Result<(), ConnectorError> {
        self.connection.stop(immediate).await?;
        info!(dialect = %self.dialect, immediate, "Database connection closed");
        Ok(())
    }

    /// Runs one statement with positional `?` parameters on the active backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's [`ConnectorError`]; failures are also logged here.
    pub async fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, ConnectorError> {
        if self.verbose {
            info!(dialect = %self.dialect, sql, params = %params_to_string(params), "Executing query");
        } else {
            debug!(dialect = %self.dialect, sql, params = %params_to_string(params), "Executing query");
        }

        let result = self.connection.execute_query(sql, params).await;

        if let Err(e) = &result {
            error!(dialect = %self.dialect, error = %e, sql, "Query failed");
        }

        result
    }
}
