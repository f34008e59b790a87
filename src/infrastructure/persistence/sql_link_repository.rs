//! SQL implementation of [`LinkRepository`] on top of the database connector.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::entities::{Link, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::database::{
    ConnectorError, DatabaseConnector, QueryResult, Row, SqlValue,
};

const COLUMNS: &str = "id, codigo, url, nome, visitas, expira_em";

/// Link repository for MySQL and SQL Server.
///
/// Statements are written once with `?` placeholders; the few dialect
/// differences (case-sensitive comparison, generated id, current date) come
/// from [`crate::infrastructure::database::SqlDialect`].
pub struct SqlLinkRepository {
    connector: Arc<DatabaseConnector>,
}

impl SqlLinkRepository {
    pub fn new(connector: Arc<DatabaseConnector>) -> Self {
        Self { connector }
    }

    fn table(&self) -> &str {
        self.connector.table()
    }

    async fn fetch_one(&self, sql: &str, params: &[SqlValue]) -> Result<Option<Link>, AppError> {
        let result = self.connector.execute_query(sql, params).await?;
        Ok(result.first().map(link_from_row).transpose()?)
    }
}

fn required<'a>(row: &'a Row, column: &str) -> Result<&'a SqlValue, ConnectorError> {
    row.get(column)
        .filter(|v| !v.is_null())
        .ok_or_else(|| ConnectorError::Decode(format!("column '{column}' missing or null")))
}

fn required_i64(row: &Row, column: &str) -> Result<i64, ConnectorError> {
    required(row, column)?
        .as_i64()
        .ok_or_else(|| ConnectorError::Decode(format!("column '{column}' is not an integer")))
}

fn required_text(row: &Row, column: &str) -> Result<String, ConnectorError> {
    required(row, column)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ConnectorError::Decode(format!("column '{column}' is not text")))
}

fn link_from_row(row: &Row) -> Result<Link, ConnectorError> {
    let expires_on = match row.get("expira_em") {
        None | Some(SqlValue::Null) => None,
        Some(value) => Some(value.as_date().ok_or_else(|| {
            ConnectorError::Decode("column 'expira_em' is not a date".to_string())
        })?),
    };

    Ok(Link {
        id: required_i64(row, "id")?,
        code: required_text(row, "codigo")?,
        url: required_text(row, "url")?,
        name: required_text(row, "nome")?,
        visits: required_i64(row, "visitas")?,
        expires_on,
    })
}

/// Reads a count either from the driver or from the first column named `column`.
fn reported_count(result: &QueryResult, column: &str) -> Option<u64> {
    result.rows_affected.or_else(|| {
        result
            .first()
            .and_then(|row| row.get(column))
            .and_then(SqlValue::as_i64)
            .and_then(|v| u64::try_from(v).ok())
    })
}

#[async_trait]
impl LinkRepository for SqlLinkRepository {
    async fn get_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM {} WHERE id = ?", self.table());
        self.fetch_one(&sql, &[id.into()]).await
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE {}",
            self.table(),
            self.connector.dialect().code_filter()
        );
        self.fetch_one(&sql, &[code.into()]).await
    }

    async fn insert(&self, new_link: NewLink) -> Result<i64, AppError> {
        let sql = format!(
            "INSERT INTO {} (codigo, url, nome, visitas, expira_em) VALUES (?, ?, ?, 0, ?){}",
            self.table(),
            self.connector.dialect().insert_id_suffix().unwrap_or_default()
        );
        let params: [SqlValue; 4] = [
            new_link.code.into(),
            new_link.url.into(),
            new_link.name.into(),
            new_link.expires_on.into(),
        ];

        let result = self.connector.execute_query(&sql, &params).await?;

        let id = result
            .last_insert_id
            .and_then(|id| i64::try_from(id).ok())
            .or_else(|| result.first().and_then(|row| row.get("id")).and_then(SqlValue::as_i64))
            .ok_or_else(|| ConnectorError::Decode("insert did not report an id".to_string()))?;

        Ok(id)
    }

    async fn increment_visits(&self, id: i64) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET visitas = visitas + 1 WHERE id = ?",
            self.table()
        );
        self.connector.execute_query(&sql, &[id.into()]).await?;
        Ok(())
    }

    async fn update(&self, link: &Link) -> Result<(), AppError> {
        let sql = format!(
            "UPDATE {} SET codigo = ?, url = ?, nome = ?, visitas = ? WHERE id = ?",
            self.table()
        );
        let params: [SqlValue; 5] = [
            link.code.as_str().into(),
            link.url.as_str().into(),
            link.name.as_str().into(),
            link.visits.into(),
            link.id.into(),
        ];

        self.connector.execute_query(&sql, &params).await?;
        Ok(())
    }

    async fn update_name(&self, id: i64, name: &str) -> Result<(), AppError> {
        let sql = format!("UPDATE {} SET nome = ? WHERE id = ?", self.table());
        self.connector
            .execute_query(&sql, &[name.into(), id.into()])
            .await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Link>, AppError> {
        let sql = format!("SELECT {COLUMNS} FROM {} ORDER BY id ASC", self.table());
        let result = self.connector.execute_query(&sql, &[]).await?;

        Ok(result
            .rows
            .iter()
            .map(link_from_row)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn delete_by_id(&self, id: i64) -> Result<Option<Link>, AppError> {
        let Some(link) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let sql = format!("DELETE FROM {} WHERE id = ?", self.table());
        self.connector.execute_query(&sql, &[id.into()]).await?;

        Ok(Some(link))
    }

    async fn delete_all_expired(&self) -> Result<u64, AppError> {
        let dialect = self.connector.dialect();
        let sql = format!(
            "DELETE FROM {} WHERE expira_em < {}{}",
            self.table(),
            dialect.current_date(),
            dialect.rows_affected_suffix().unwrap_or_default()
        );

        let result = self.connector.execute_query(&sql, &[]).await?;
        Ok(reported_count(&result, "affected").unwrap_or(0))
    }
}
