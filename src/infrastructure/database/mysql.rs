//! MySQL backend over a `sqlx` connection pool.

use async_trait::async_trait;
use futures_util::TryStreamExt;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Either, Execute, Executor, MySql, MySqlPool, Row as _, TypeInfo};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{
    ConnectionSettings, ConnectorError, DatabaseConnection, MySqlSettings, QueryResult, Row,
    SqlDialect, SqlValue,
};

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// MySQL connection backed by a shared pool.
///
/// Statements keep their native `?` placeholders. Parameterless statements go
/// through the text protocol so that multi-statement scripts work.
#[derive(Default)]
pub struct MySqlConnection {
    settings: Option<MySqlSettings>,
    pool: RwLock<Option<MySqlPool>>,
}

impl MySqlConnection {
    pub fn new() -> Self {
        Self::default()
    }

    async fn pool(&self) -> Result<MySqlPool, ConnectorError> {
        self.pool.read().await.clone().ok_or(ConnectorError::NotStarted)
    }

    fn connect_options(settings: &MySqlSettings) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .username(&settings.user)
            .database(&settings.database);

        match &settings.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

#[async_trait]
impl DatabaseConnection for MySqlConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::MySql
    }

    fn configure(&mut self, settings: ConnectionSettings) -> Result<(), ConnectorError> {
        match settings {
            ConnectionSettings::MySql(s) => {
                self.settings = Some(s);
                Ok(())
            }
            other => Err(ConnectorError::Config(format!(
                "MySQL backend cannot use {} settings",
                other.dialect()
            ))),
        }
    }

    async fn start(&self, verbose: bool) -> Result<(), ConnectorError> {
        let settings = self
            .settings
            .as_ref()
            .ok_or_else(|| ConnectorError::Config("MySQL settings missing".to_string()))?;

        if verbose {
            info!(host = %settings.host, port = settings.port, database = %settings.database, "Connecting to MySQL");
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(Self::connect_options(settings))
            .await
            .map_err(|e| ConnectorError::Connection {
                dialect: SqlDialect::MySql.name(),
                message: e.to_string(),
            })?;

        *self.pool.write().await = Some(pool);
        Ok(())
    }

    async fn stop(&self, immediate: bool) -> Result<(), ConnectorError> {
        let Some(pool) = self.pool.write().await.take() else {
            return Ok(());
        };

        if immediate {
            // close() marks the pool closed on call; awaiting only waits for checked-out connections
            drop(pool.close());
        } else {
            pool.close().await;
        }

        Ok(())
    }

    async fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, ConnectorError> {
        let pool = self.pool().await?;

        if params.is_empty() {
            return collect(&pool, sqlx::raw_sql(sql)).await;
        }

        let mut query = sqlx::query(sql);
        for value in params {
            query = bind_value(query, value);
        }
        collect(&pool, query).await
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Text(v) => query.bind(v.clone()),
        SqlValue::Date(v) => query.bind(*v),
        SqlValue::DateTime(v) => query.bind(*v),
        SqlValue::Bytes(v) => query.bind(v.clone()),
    }
}

async fn collect<'q, E>(pool: &MySqlPool, query: E) -> Result<QueryResult, ConnectorError>
where
    E: 'q + Execute<'q, MySql>,
{
    let mut stream = pool.fetch_many(query);
    let mut result = QueryResult::default();
    let mut affected = 0u64;

    while let Some(item) = stream.try_next().await? {
        match item {
            Either::Left(done) => {
                affected += done.rows_affected();
                if done.last_insert_id() != 0 {
                    result.last_insert_id = Some(done.last_insert_id());
                }
            }
            Either::Right(row) => result.rows.push(decode_row(&row)?),
        }
    }

    result.rows_affected = Some(affected);
    debug!(
        rows = result.rows.len(),
        affected, "MySQL statement completed"
    );
    Ok(result)
}

/// Unsigned values above `i64::MAX` are kept as their decimal text.
fn unsigned_value(v: u64) -> SqlValue {
    i64::try_from(v).map_or_else(|_| SqlValue::Text(v.to_string()), SqlValue::Int)
}

/// Converts a driver row into a `column -> value` record by column type name.
fn decode_row(row: &MySqlRow) -> Result<Row, ConnectorError> {
    let mut out = Row::new();

    for (index, column) in row.columns().iter().enumerate() {
        let type_name = column.type_info().name();

        let value = match type_name {
            "NULL" => SqlValue::Null,
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Int),
            t if t.ends_with("UNSIGNED") => row
                .try_get::<Option<u64>, _>(index)?
                .map_or(SqlValue::Null, unsigned_value),
            "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Float),
            "DECIMAL" => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map_or(SqlValue::Null, |v| {
                    v.parse().map_or(SqlValue::Text(v), SqlValue::Float)
                }),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Date),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::DateTime),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(index)?
                .map_or(SqlValue::Null, |v| SqlValue::Text(v.to_string())),
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
                .try_get::<Option<Vec<u8>>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Bytes),
            _ => row
                .try_get_unchecked::<Option<String>, _>(index)?
                .map_or(SqlValue::Null, SqlValue::Text),
        };

        out.insert(column.name(), value);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> MySqlSettings {
        MySqlSettings {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: None,
            database: "encurta".to_string(),
        }
    }

    #[test]
    fn test_configure_rejects_foreign_settings() {
        let mut conn = MySqlConnection::new();
        let err = conn
            .configure(ConnectionSettings::SqlServer(super::super::SqlServerSettings {
                host: "db".to_string(),
                port: 1433,
                user: "sa".to_string(),
                password: "pw".to_string(),
                database: "encurta".to_string(),
                trust_server_certificate: false,
            }))
            .unwrap_err();

        assert!(matches!(err, ConnectorError::Config(_)));
    }

    #[tokio::test]
    async fn test_query_before_start_fails() {
        let mut conn = MySqlConnection::new();
        conn.configure(ConnectionSettings::MySql(settings())).unwrap();

        let err = conn.execute_query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotStarted));
    }

    #[test]
    fn test_unsigned_value_does_not_wrap() {
        assert_eq!(unsigned_value(42), SqlValue::Int(42));
        assert_eq!(unsigned_value(i64::MAX as u64), SqlValue::Int(i64::MAX));
        assert_eq!(
            unsigned_value(u64::MAX),
            SqlValue::Text("18446744073709551615".to_string())
        );
    }

    #[tokio::test]
    async fn test_stop_without_start_is_noop() {
        let conn = MySqlConnection::new();
        assert!(conn.stop(false).await.is_ok());
    }

    #[tokio::test]
    #[ignore = "requires a running MySQL server (MYSQL_HOST etc.)"]
    async fn test_round_trip_against_server() {
        let mut conn = MySqlConnection::new();
        conn.configure(ConnectionSettings::MySql(MySqlSettings {
            host: std::env::var("MYSQL_HOST").unwrap_or_else(|_| "localhost".to_string()),
            password: std::env::var("MYSQL_PASSWORD").ok(),
            ..settings()
        }))
        .unwrap();
        conn.start(true).await.unwrap();

        let result = conn
            .execute_query("SELECT ? AS n, ? AS s", &[SqlValue::Int(5), "abc".into()])
            .await
            .unwrap();

        let row = result.first().unwrap();
        assert_eq!(row.get("n").and_then(SqlValue::as_i64), Some(5));
        assert_eq!(row.get("s").and_then(SqlValue::as_str), Some("abc"));

        conn.stop(false).await.unwrap();
    }
}
