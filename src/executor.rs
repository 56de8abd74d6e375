//! Query executor.
//!
//! Runs each sanitized statement against the database on one connection,
//! isolating per-statement failure: a statement that errors is recorded as
//! the "No data" sentinel and the remaining statements still run. There are
//! no transaction semantics across statements.

use crate::config::DbConfig;
use crate::error::Result;
use serde_json::{json, Value};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row, TypeInfo};
use tracing::warn;

/// Placeholder recorded for a statement whose execution failed.
pub const NO_DATA_SENTINEL: &str = "No data";

#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Rows(Vec<Value>),
    NoData,
}

impl QueryOutcome {
    pub fn is_no_data(&self) -> bool {
        matches!(self, QueryOutcome::NoData)
    }

    pub fn as_json(&self) -> Value {
        match self {
            QueryOutcome::Rows(rows) => Value::Array(rows.clone()),
            QueryOutcome::NoData => Value::String(NO_DATA_SENTINEL.to_string()),
        }
    }
}

/// (statement, result-or-sentinel) pair, ephemeral to one request.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRecord {
    pub statement: String,
    pub outcome: QueryOutcome,
}

impl QueryRecord {
    pub fn as_json(&self) -> Value {
        json!({
            "query": self.statement,
            "data": self.outcome.as_json(),
        })
    }
}

pub struct QueryExecutor {
    db: DbConfig,
}

impl QueryExecutor {
    pub fn new(db: DbConfig) -> Self {
        Self { db }
    }

    /// Execute the statements in order. Output preserves input order and
    /// always has one record per statement.
    pub async fn execute(&self, statements: &[String]) -> Result<Vec<QueryRecord>> {
        let mut conn = MySqlConnection::connect_with(&self.db.connect_options()).await?;
        let mut records = Vec::with_capacity(statements.len());

        for statement in statements {
            let outcome = match sqlx::query(statement).fetch_all(&mut conn).await {
                Ok(rows) => QueryOutcome::Rows(rows.iter().map(row_to_json).collect()),
                Err(e) => {
                    warn!("Statement failed, recording sentinel: {} ({})", statement, e);
                    QueryOutcome::NoData
                }
            };
            records.push(QueryRecord {
                statement: statement.clone(),
                outcome,
            });
        }

        conn.close().await?;
        Ok(records)
    }
}

/// Convert a database row to JSON, decoding by MySQL column type.
fn row_to_json(row: &MySqlRow) -> Value {
    let mut map = serde_json::Map::new();

    for column in row.columns() {
        let name = column.name();
        let type_name = column.type_info().name();

        let value: Option<Value> = match type_name {
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(name)
                .ok()
                .flatten()
                .map(Value::from),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" => row
                .try_get::<Option<i64>, _>(name)
                .ok()
                .flatten()
                .map(Value::from),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => row
                .try_get::<Option<u64>, _>(name)
                .ok()
                .flatten()
                .map(Value::from),
            "YEAR" => row
                .try_get::<Option<u16>, _>(name)
                .ok()
                .flatten()
                .map(|y| Value::from(u64::from(y))),
            "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(name)
                .ok()
                .flatten()
                .map(Value::from),
            "DECIMAL" => row
                .try_get::<Option<rust_decimal::Decimal>, _>(name)
                .ok()
                .flatten()
                .map(|d| Value::from(d.to_string())),
            "VARCHAR" | "CHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => row
                .try_get::<Option<String>, _>(name)
                .ok()
                .flatten()
                .map(Value::from),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(name)
                .ok()
                .flatten()
                .map(|d| Value::from(d.to_string())),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(name)
                .ok()
                .flatten()
                .map(|t| Value::from(t.to_string())),
            "DATETIME" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(name)
                .ok()
                .flatten()
                .map(|dt| Value::from(dt.to_string())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name)
                .ok()
                .flatten()
                .map(|dt| Value::from(dt.to_rfc3339())),
            "JSON" => row.try_get::<Option<Value>, _>(name).ok().flatten(),
            "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
                .try_get::<Option<Vec<u8>>, _>(name)
                .ok()
                .flatten()
                .map(|bytes| Value::from(String::from_utf8_lossy(&bytes).into_owned())),
            _ => None,
        };

        map.insert(name.to_string(), value.unwrap_or(Value::Null));
    }

    Value::Object(map)
}
