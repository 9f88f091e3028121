//! Statement execution.
//!
//! Everything above this module talks to the database through the
//! [`Executor`] trait, so schema management and repositories can be driven by
//! a scripted executor in tests. [`MySqlExecutor`] is the sqlx-backed
//! implementation.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::mysql::{MySqlArguments, MySqlDatabaseError, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, MySql, Row as SqlxRow, TypeInfo, ValueRef};
use tracing::{debug, warn};
use wink_sql_builder::utils::underline_to_camel;
use wink_sql_builder::SqlValue;

use crate::config::ConnectionConfig;
use crate::error::{OrmError, Result};

// ============================================================================
// Results
// ============================================================================

/// One result row with its column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    /// Creates a row from `(column, value)` pairs.
    #[must_use]
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, SqlValue)>,
        S: Into<String>,
    {
        let (columns, values) = pairs.into_iter().map(|(c, v)| (c.into(), v)).unzip();
        Self { columns, values }
    }

    /// Column names in select order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Value of `column`.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// Value of the first column.
    #[must_use]
    pub fn first(&self) -> Option<&SqlValue> {
        self.values.first()
    }

    /// Converts the row into a JSON object, optionally renaming
    /// `snake_case` columns to `camelCase` keys.
    #[must_use]
    pub fn into_json(self, camel_case: bool) -> Value {
        let object: Map<String, Value> = self
            .columns
            .into_iter()
            .zip(self.values)
            .map(|(column, value)| {
                let key = if camel_case { underline_to_camel(&column) } else { column };
                (key, sql_value_to_json(value))
            })
            .collect();
        Value::Object(object)
    }
}

fn sql_value_to_json(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(b),
        SqlValue::Int(i) => Value::from(i),
        SqlValue::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(bytes) => Value::from(bytes),
        SqlValue::DateTime(dt) => Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
    }
}

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecSummary {
    /// `auto_increment` value generated by an insert.
    pub insert_id: u64,
    /// Rows changed by the statement.
    pub affected_rows: u64,
}

/// What a statement produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutput {
    /// Result set of a query.
    Rows(Vec<Row>),
    /// Summary of a modification or DDL statement.
    Summary(ExecSummary),
}

impl ExecOutput {
    /// Returns the rows of a query.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnexpectedResult`] for a summary.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Summary(_) => Err(OrmError::UnexpectedResult(String::from("expected rows, got a summary"))),
        }
    }

    /// Returns the summary of a modification.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::UnexpectedResult`] for a result set.
    pub fn into_summary(self) -> Result<ExecSummary> {
        match self {
            Self::Summary(summary) => Ok(summary),
            Self::Rows(_) => Err(OrmError::UnexpectedResult(String::from("expected a summary, got rows"))),
        }
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs one parameterized statement.
#[async_trait]
pub trait Executor: Send + Sync {
    /// Executes `sql` with `values` bound to its `?` placeholders in order.
    async fn exec(&self, sql: &str, values: &[SqlValue]) -> Result<ExecOutput>;
}

/// Returns `true` for statements that produce a result set.
#[must_use]
pub fn returns_rows(sql: &str) -> bool {
    let keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    matches!(
        keyword.as_str(),
        "select" | "show" | "describe" | "desc" | "explain" | "with"
    )
}

/// [`Executor`] over a sqlx MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlExecutor {
    pool: MySqlPool,
}

/// Error number of `ER_NO_SUCH_TABLE`.
const ER_NO_SUCH_TABLE: u16 = 1146;

/// Error number of `ER_PARSE_ERROR`.
const ER_PARSE_ERROR: u16 = 1064;

impl MySqlExecutor {
    /// Wraps an existing pool.
    #[must_use]
    pub const fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `config`.
    ///
    /// The `connection_limit` parameter, when present, caps the pool size.
    ///
    /// # Errors
    ///
    /// Returns [`OrmError::Database`] when the pool cannot connect.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut options = MySqlPoolOptions::new();
        if let Some(limit) = config
            .params
            .get("connection_limit")
            .and_then(|v| v.parse().ok())
        {
            options = options.max_connections(limit);
        }
        let pool = options.connect_with(config.connect_options()).await?;
        debug!(host = %config.host, database = %config.database, "connection pool opened");
        Ok(Self::new(pool))
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    fn bind_value<'q>(
        query: sqlx::query::Query<'q, MySql, MySqlArguments>,
        value: &'q SqlValue,
    ) -> sqlx::query::Query<'q, MySql, MySqlArguments> {
        match value {
            SqlValue::Null => query.bind(None::<i32>),
            SqlValue::Bool(b) => query.bind(b),
            SqlValue::Int(i) => query.bind(i),
            SqlValue::Float(f) => query.bind(f),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Blob(b) => query.bind(b.as_slice()),
            SqlValue::DateTime(dt) => query.bind(dt),
        }
    }

    fn convert_value(mysql_row: &MySqlRow, index: usize) -> Result<SqlValue> {
        if mysql_row.try_get_raw(index)?.is_null() {
            return Ok(SqlValue::Null);
        }
        // None of the scalar decoders below accept these types.
        match mysql_row.columns()[index].type_info().name() {
            "DECIMAL" => {
                if let Ok(value) = mysql_row.try_get::<Decimal, _>(index) {
                    return Ok(decimal_to_sql_value(value));
                }
            }
            "JSON" => {
                if let Ok(value) = mysql_row.try_get::<Value, _>(index) {
                    return Ok(SqlValue::Text(value.to_string()));
                }
            }
            "TIME" => {
                if let Ok(value) = mysql_row.try_get::<NaiveTime, _>(index) {
                    return Ok(time_to_sql_value(value));
                }
            }
            _ => {}
        }
        let value = if let Ok(value) = mysql_row.try_get::<i64, _>(index) {
            SqlValue::Int(value)
        } else if let Ok(value) = mysql_row.try_get::<u64, _>(index) {
            SqlValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
        } else if let Ok(value) = mysql_row.try_get::<f64, _>(index) {
            SqlValue::Float(value)
        } else if let Ok(value) = mysql_row.try_get::<String, _>(index) {
            SqlValue::Text(value)
        } else if let Ok(value) = mysql_row.try_get::<NaiveDateTime, _>(index) {
            SqlValue::DateTime(value)
        } else if let Ok(value) = mysql_row.try_get::<NaiveDate, _>(index) {
            SqlValue::DateTime(value.and_time(chrono::NaiveTime::MIN))
        } else if let Ok(value) = mysql_row.try_get::<Vec<u8>, _>(index) {
            // Binary collations and `show create table` arrive as blobs.
            match String::from_utf8(value) {
                Ok(text) => SqlValue::Text(text),
                Err(err) => SqlValue::Blob(err.into_bytes()),
            }
        } else {
            warn!(column = %mysql_row.columns()[index].name(), "undecodable column read as null");
            SqlValue::Null
        };
        Ok(value)
    }

    fn convert_row(mysql_row: &MySqlRow) -> Result<Row> {
        let mut row = Row::default();
        for (index, column) in mysql_row.columns().iter().enumerate() {
            row.columns.push(column.name().to_string());
            row.values.push(Self::convert_value(mysql_row, index)?);
        }
        Ok(row)
    }

    fn map_error(sql: &str, err: sqlx::Error) -> OrmError {
        let (number, message) = match &err {
            sqlx::Error::Database(db) => (
                db.try_downcast_ref::<MySqlDatabaseError>()
                    .map(MySqlDatabaseError::number),
                db.message().to_string(),
            ),
            _ => (None, String::new()),
        };
        match number {
            Some(ER_NO_SUCH_TABLE) => OrmError::NoSuchTable(message),
            Some(ER_PARSE_ERROR) => OrmError::SqlSyntax {
                sql: sql.to_string(),
                source: err,
            },
            _ => OrmError::Database(err),
        }
    }
}

/// Decimals read as floats, or as text when out of `f64` range.
fn decimal_to_sql_value(value: Decimal) -> SqlValue {
    value
        .to_f64()
        .map_or_else(|| SqlValue::Text(value.to_string()), SqlValue::Float)
}

fn time_to_sql_value(value: NaiveTime) -> SqlValue {
    SqlValue::Text(value.format("%H:%M:%S%.f").to_string())
}

#[async_trait]
impl Executor for MySqlExecutor {
    async fn exec(&self, sql: &str, values: &[SqlValue]) -> Result<ExecOutput> {
        debug!(sql = %sql, values = ?values, "executing");
        let mut query = sqlx::query(sql);
        for value in values {
            query = Self::bind_value(query, value);
        }

        if returns_rows(sql) {
            let mysql_rows = query
                .fetch_all(&self.pool)
                .await
                .map_err(|err| Self::map_error(sql, err))?;
            let rows = mysql_rows.iter().map(Self::convert_row).collect::<Result<Vec<_>>>()?;
            Ok(ExecOutput::Rows(rows))
        } else {
            let result = query
                .execute(&self.pool)
                .await
                .map_err(|err| Self::map_error(sql, err))?;
            Ok(ExecOutput::Summary(ExecSummary {
                insert_id: result.last_insert_id(),
                affected_rows: result.rows_affected(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_returns_rows() {
        assert!(returns_rows("select * from `user`"));
        assert!(returns_rows("  SHOW TABLES"));
        assert!(returns_rows("show create table `user`"));
        assert!(!returns_rows("insert into `user` (`a`) values (?)"));
        assert!(!returns_rows("alter table `db`.`user`\nadd column `a` int(4);"));
        assert!(!returns_rows(""));
    }

    #[test]
    fn test_decimal_and_time_values() {
        assert_eq!(decimal_to_sql_value(Decimal::new(1250, 2)), SqlValue::Float(12.5));
        assert_eq!(decimal_to_sql_value(Decimal::ZERO), SqlValue::Float(0.0));
        let time = NaiveTime::from_hms_opt(8, 30, 5).unwrap();
        assert_eq!(time_to_sql_value(time), SqlValue::Text(String::from("08:30:05")));
    }

    #[test]
    fn test_row_access_and_json() {
        let row = Row::new([
            ("id", SqlValue::Int(1)),
            ("role_id", SqlValue::Int(2)),
            ("nick_name", SqlValue::Text(String::from("a"))),
            ("deleted_at", SqlValue::Null),
        ]);
        assert_eq!(row.get("role_id"), Some(&SqlValue::Int(2)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.first(), Some(&SqlValue::Int(1)));
        assert_eq!(
            row.into_json(true),
            serde_json::json!({"id": 1, "roleId": 2, "nickName": "a", "deletedAt": null})
        );
    }

    #[test]
    fn test_datetime_json_is_parseable() {
        let dt = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        let json = Row::new([("at", SqlValue::DateTime(dt))]).into_json(false);
        let back: NaiveDateTime = serde_json::from_value(json["at"].clone()).unwrap();
        assert_eq!(back, dt);
    }

    #[test]
    fn test_output_shape_mismatch() {
        let output = ExecOutput::Rows(Vec::new());
        assert!(matches!(output.into_summary(), Err(OrmError::UnexpectedResult(_))));
        let output = ExecOutput::Summary(ExecSummary::default());
        assert!(output.clone().into_rows().is_err());
        assert_eq!(output.into_summary().unwrap().insert_id, 0);
    }
}
