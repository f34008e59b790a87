//! Connector error type.

/// Errors raised by the database connector.
///
/// Only [`ConnectorError::Connection`] raised from `start` is treated as fatal;
/// everything else is a per-query failure reported to the caller.
///
/// [`ConnectorError::Unavailable`] and [`ConnectorError::NotStarted`] are
/// raised before the statement reaches the server, so the statement is known
/// not to have run.
#[derive(Debug, thiserror::Error)]
pub enum ConnectorError {
    #[error("Invalid connector configuration: {0}")]
    Config(String),

    #[error("Failed to connect to {dialect}: {message}")]
    Connection {
        dialect: &'static str,
        message: String,
    },

    #[error("Connector has not been started")]
    NotStarted,

    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Statement has {placeholders} placeholder(s) but {params} parameter(s) were given")]
    ParameterCount { placeholders: usize, params: usize },

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Unexpected result shape: {0}")]
    Decode(String),

    #[error("Failed to read script {path}: {source}")]
    Script {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConnectorError {
    /// True if the statement was never sent, so running it again cannot apply it twice.
    pub fn is_before_send(&self) -> bool {
        matches!(self, ConnectorError::Unavailable(_) | ConnectorError::NotStarted)
    }
}

impl From<sqlx::Error> for ConnectorError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                ConnectorError::Decode(e.to_string())
            }
            // raised while acquiring a connection
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ConnectorError::Unavailable(e.to_string())
            }
            other => ConnectorError::Query(other.to_string()),
        }
    }
}

impl From<tiberius::error::Error> for ConnectorError {
    fn from(e: tiberius::error::Error) -> Self {
        ConnectorError::Query(e.to_string())
    }
}
