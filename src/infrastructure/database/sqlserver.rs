//! SQL Server backend over `tiberius`.
//!
//! Every query opens its own connection, runs, and closes it again. Positional
//! placeholders are rewritten to `@paramN` and the statement is executed through
//! `sp_executesql` so the names survive as declared parameters.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Instant;
use tiberius::{AuthMethod, Client, ColumnData, Config, FromSql, Query, QueryStream};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info, warn};

use super::placeholders::{translate_placeholders, NamedStatement};
use super::{
    ConnectionSettings, ConnectorError, DatabaseConnection, QueryResult, Row, SqlDialect,
    SqlServerSettings, SqlValue,
};

type SqlClient = Client<Compat<TcpStream>>;

#[derive(Default)]
struct Lifecycle {
    started: AtomicBool,
    in_flight: AtomicUsize,
    idle: Notify,
    next_request: AtomicU64,
}

/// Tracks one running query; wakes `stop` when the last one finishes.
struct InFlight<'a>(&'a Lifecycle);

impl<'a> InFlight<'a> {
    fn enter(lifecycle: &'a Lifecycle) -> Self {
        lifecycle.in_flight.fetch_add(1, Ordering::SeqCst);
        Self(lifecycle)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.0.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// SQL Server connection with a connection-per-query model.
#[derive(Default)]
pub struct SqlServerConnection {
    config: Option<Config>,
    lifecycle: Lifecycle,
}

impl SqlServerConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_config(settings: &SqlServerSettings) -> Config {
        let mut config = Config::new();
        config.host(&settings.host);
        config.port(settings.port);
        config.database(&settings.database);
        config.application_name(env!("CARGO_PKG_NAME"));
        config.authentication(AuthMethod::sql_server(&settings.user, &settings.password));
        if settings.trust_server_certificate {
            config.trust_cert();
        }
        config
    }

    fn config(&self) -> Result<&Config, ConnectorError> {
        self.config
            .as_ref()
            .ok_or_else(|| ConnectorError::Config("SQL Server settings missing".to_string()))
    }
}

async fn connect(config: &Config) -> Result<SqlClient, tiberius::error::Error> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    match Client::connect(config.clone(), tcp.compat_write()).await {
        Ok(client) => Ok(client),
        // Azure SQL may redirect the login to another node
        Err(tiberius::error::Error::Routing { host, port }) => {
            let mut redirected = config.clone();
            redirected.host(&host);
            redirected.port(port);

            let tcp = TcpStream::connect(redirected.get_addr()).await?;
            tcp.set_nodelay(true)?;
            Client::connect(redirected, tcp.compat_write()).await
        }
        Err(e) => Err(e),
    }
}

#[async_trait]
impl DatabaseConnection for SqlServerConnection {
    fn dialect(&self) -> SqlDialect {
        SqlDialect::SqlServer
    }

    fn configure(&mut self, settings: ConnectionSettings) -> Result<(), ConnectorError> {
        match settings {
            ConnectionSettings::SqlServer(s) => {
                self.config = Some(Self::build_config(&s));
                Ok(())
            }
            other => Err(ConnectorError::Config(format!(
                "SQL Server backend cannot use {} settings",
                other.dialect()
            ))),
        }
    }

    async fn start(&self, verbose: bool) -> Result<(), ConnectorError> {
        let config = self.config()?;
        if verbose {
            info!(addr = %config.get_addr(), "Connecting to SQL Server");
        }

        let probe = async {
            let mut client = connect(config).await?;
            client.simple_query("SELECT 1").await?.into_results().await?;
            client.close().await
        };

        probe.await.map_err(|e| ConnectorError::Connection {
            dialect: SqlDialect::SqlServer.name(),
            message: e.to_string(),
        })?;

        self.lifecycle.started.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, immediate: bool) -> Result<(), ConnectorError> {
        self.lifecycle.started.store(false, Ordering::SeqCst);
        if immediate {
            return Ok(());
        }

        loop {
            let idle = self.lifecycle.idle.notified();
            let pending = self.lifecycle.in_flight.load(Ordering::SeqCst);
            if pending == 0 {
                break;
            }
            debug!(pending, "Waiting for in-flight SQL Server queries");
            idle.await;
        }

        Ok(())
    }

    async fn execute_query(
        &self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, ConnectorError> {
        if !self.lifecycle.started.load(Ordering::SeqCst) {
            return Err(ConnectorError::NotStarted);
        }
        let config = self.config()?;
        let statement = translate_placeholders(sql, params)?;

        let _guard = InFlight::enter(&self.lifecycle);
        let request_id = self.lifecycle.next_request.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let mut client = connect(config)
            .await
            .map_err(|e| ConnectorError::Unavailable(e.to_string()))?;
        let result = {
            let stream = if statement.params.is_empty() {
                client.simple_query(statement.sql).await?
            } else {
                build_query(&statement).query(&mut client).await?
            };
            collect(stream).await?
        };

        if let Err(e) = client.close().await {
            warn!(request_id, error = %e, "Failed to close SQL Server connection");
        }

        debug!(
            request_id,
            rows = result.rows.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "SQL Server statement completed"
        );
        Ok(result)
    }
}

fn declared_type(value: &SqlValue) -> &'static str {
    match value {
        SqlValue::Null | SqlValue::Text(_) => "NVARCHAR(MAX)",
        SqlValue::Bool(_) => "BIT",
        SqlValue::Int(_) => "BIGINT",
        SqlValue::Float(_) => "FLOAT",
        SqlValue::Date(_) => "DATE",
        SqlValue::DateTime(_) => "DATETIME2",
        SqlValue::Bytes(_) => "VARBINARY(MAX)",
    }
}

/// Wraps a named statement in `sp_executesql`, mapping `@paramN` onto the
/// driver's positional `@P1..`.
fn wrap_sp_executesql(statement: &NamedStatement) -> String {
    let declarations = statement
        .params
        .iter()
        .map(|p| format!("@{} {}", p.name, declared_type(&p.value)))
        .collect::<Vec<_>>()
        .join(", ");

    let assignments = statement
        .params
        .iter()
        .enumerate()
        .map(|(i, p)| format!("@{} = @P{}", p.name, i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "EXEC sp_executesql N'{}', N'{}', {}",
        statement.sql.replace('\'', "''"),
        declarations,
        assignments
    )
}

fn build_query(statement: &NamedStatement) -> Query<'static> {
    let mut query = Query::new(wrap_sp_executesql(statement));

    for param in &statement.params {
        match &param.value {
            SqlValue::Null => query.bind(Option::<String>::None),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::DateTime(v) => query.bind(*v),
            SqlValue::Bytes(v) => query.bind(v.clone()),
        }
    }

    query
}

/// Flattens every result set of the stream into one list of rows.
async fn collect(stream: QueryStream<'_>) -> Result<QueryResult, ConnectorError> {
    let mut rows = Vec::new();

    for result_set in stream.into_results().await? {
        for row in result_set {
            let names: Vec<String> = row.columns().iter().map(|c| c.name().to_string()).collect();
            let mut out = Row::new();
            for (name, data) in names.into_iter().zip(row) {
                out.insert(name, decode_column(data)?);
            }
            rows.push(out);
        }
    }

    Ok(QueryResult::from_rows(rows))
}

fn decode_column(data: ColumnData<'static>) -> Result<SqlValue, ConnectorError> {
    let value = match data {
        ColumnData::U8(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I16(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I32(v) => v.map(|v| SqlValue::Int(i64::from(v))),
        ColumnData::I64(v) => v.map(SqlValue::Int),
        ColumnData::F32(v) => v.map(|v| SqlValue::Float(f64::from(v))),
        ColumnData::F64(v) => v.map(SqlValue::Float),
        ColumnData::Bit(v) => v.map(SqlValue::Bool),
        ColumnData::String(v) => v.map(|s| SqlValue::Text(s.into_owned())),
        ColumnData::Guid(v) => v.map(|g| SqlValue::Text(g.to_string())),
        ColumnData::Binary(v) => v.map(|b| SqlValue::Bytes(b.into_owned())),
        ColumnData::Numeric(v) => v.map(|n| SqlValue::Float(f64::from(n))),
        ColumnData::Xml(v) => v.map(|x| SqlValue::Text(x.into_owned().into_string())),
        other => return decode_temporal(&other),
    };

    Ok(value.unwrap_or(SqlValue::Null))
}

fn decode_temporal(data: &ColumnData<'static>) -> Result<SqlValue, ConnectorError> {
    let value = match data {
        ColumnData::Date(_) => NaiveDate::from_sql(data)?.map(SqlValue::Date),
        ColumnData::Time(_) => NaiveTime::from_sql(data)?.map(|t| SqlValue::Text(t.to_string())),
        ColumnData::DateTimeOffset(_) => chrono::DateTime::<Utc>::from_sql(data)?
            .map(|dt| SqlValue::DateTime(dt.naive_utc())),
        ColumnData::DateTime(_) | ColumnData::SmallDateTime(_) | ColumnData::DateTime2(_) => {
            NaiveDateTime::from_sql(data)?.map(SqlValue::DateTime)
        }
        other => {
            return Err(ConnectorError::Decode(format!(
                "unsupported SQL Server column: {other:?}"
            )));
        }
    };

    Ok(value.unwrap_or(SqlValue::Null))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn statement(sql: &str, params: &[SqlValue]) -> NamedStatement {
        translate_placeholders(sql, params).unwrap()
    }

    #[test]
    fn test_wrap_declares_and_maps_params() {
        let stmt = statement(
            "SELECT * FROM link WHERE codigo = ? AND id = ?",
            &["abcde".into(), SqlValue::Int(3)],
        );

        assert_eq!(
            wrap_sp_executesql(&stmt),
            "EXEC sp_executesql N'SELECT * FROM link WHERE codigo = @param1 AND id = @param2', \
             N'@param1 NVARCHAR(MAX), @param2 BIGINT', @param1 = @P1, @param2 = @P2"
        );
    }

    #[test]
    fn test_wrap_escapes_quotes_in_statement() {
        let stmt = statement("SELECT 'x' AS a, ? AS b", &[SqlValue::Int(1)]);

        assert!(wrap_sp_executesql(&stmt).starts_with("EXEC sp_executesql N'SELECT ''x'' AS a"));
    }

    #[test]
    fn test_wrap_skips_inlined_null() {
        let stmt = statement(
            "INSERT INTO link (nome, expira_em) VALUES (?, ?)",
            &["A".into(), SqlValue::Null],
        );

        let wrapped = wrap_sp_executesql(&stmt);
        assert!(wrapped.contains("VALUES (@param1, null)"));
        assert!(wrapped.ends_with("N'@param1 NVARCHAR(MAX)', @param1 = @P1"));
    }

    #[test]
    fn test_wrap_keeps_positional_names_after_null() {
        let stmt = statement("SELECT ?, ?", &[SqlValue::Null, SqlValue::Int(2)]);

        assert!(wrap_sp_executesql(&stmt).ends_with("N'@param2 BIGINT', @param2 = @P1"));
    }

    #[test]
    fn test_decode_scalar_columns() {
        assert_eq!(
            decode_column(ColumnData::I32(Some(7))).unwrap(),
            SqlValue::Int(7)
        );
        assert_eq!(
            decode_column(ColumnData::String(Some("abc".into()))).unwrap(),
            SqlValue::Text("abc".to_string())
        );
        assert_eq!(decode_column(ColumnData::I64(None)).unwrap(), SqlValue::Null);
        assert_eq!(
            decode_column(ColumnData::Bit(Some(true))).unwrap(),
            SqlValue::Bool(true)
        );
    }

    #[tokio::test]
    async fn test_query_before_start_fails() {
        let mut conn = SqlServerConnection::new();
        conn.configure(ConnectionSettings::SqlServer(SqlServerSettings {
            host: "localhost".to_string(),
            port: 1433,
            user: "sa".to_string(),
            password: "pw".to_string(),
            database: "encurta".to_string(),
            trust_server_certificate: true,
        }))
        .unwrap();

        let err = conn.execute_query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, ConnectorError::NotStarted));
    }

    #[tokio::test]
    async fn test_stop_waits_for_in_flight_queries() {
        let conn = std::sync::Arc::new(SqlServerConnection::new());
        let guard = InFlight::enter(&conn.lifecycle);

        let stopper = {
            let conn = conn.clone();
            tokio::spawn(async move { conn.stop(false).await })
        };

        tokio::task::yield_now().await;
        assert!(!stopper.is_finished());

        drop(guard);
        stopper.await.unwrap().unwrap();
        assert_eq!(conn.lifecycle.in_flight.load(Ordering::SeqCst), 0);
    }
}
