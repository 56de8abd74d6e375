//! Schema gateway.
//!
//! Introspects column metadata for one table from the live database. Each
//! call opens and closes its own connection; call volume is one per selected
//! table per request, so correctness wins over throughput here. Column
//! descriptors are fetched fresh per request and never cached, tolerating
//! schema drift at the cost of staleness-free reads.

use crate::config::DbConfig;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Connection, Row};

/// One column of an introspected table, as reported by `SHOW COLUMNS`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub nullable: String,
    pub key: String,
    pub default: Option<String>,
    pub extra: String,
}

impl ColumnDescriptor {
    fn from_row(row: &MySqlRow) -> Self {
        Self {
            name: text_field(row, "Field").unwrap_or_default(),
            data_type: text_field(row, "Type").unwrap_or_default(),
            nullable: text_field(row, "Null").unwrap_or_default(),
            key: text_field(row, "Key").unwrap_or_default(),
            default: text_field(row, "Default"),
            extra: text_field(row, "Extra").unwrap_or_default(),
        }
    }

    /// One-line rendering for prompt embedding.
    pub fn describe(&self) -> String {
        let mut line = format!("{} ({}, nullable: {}", self.name, self.data_type, self.nullable);
        if !self.key.is_empty() {
            line.push_str(&format!(", key: {}", self.key));
        }
        if let Some(default) = &self.default {
            line.push_str(&format!(", default: {}", default));
        }
        if !self.extra.is_empty() {
            line.push_str(&format!(", {}", self.extra));
        }
        line.push(')');
        line
    }
}

pub struct SchemaGateway {
    db: DbConfig,
}

impl SchemaGateway {
    pub fn new(db: DbConfig) -> Self {
        Self { db }
    }

    /// Fetch column metadata for the named table, or propagate the
    /// connection/execution failure. The identifier is trimmed but otherwise
    /// passed through; a nonexistent table surfaces as a database error.
    pub async fn columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>> {
        let table = table.trim();
        let mut conn = MySqlConnection::connect_with(&self.db.connect_options()).await?;

        let result = sqlx::query(&format!("SHOW COLUMNS FROM {}", table))
            .fetch_all(&mut conn)
            .await;
        conn.close().await?;

        Ok(result?.iter().map(ColumnDescriptor::from_row).collect())
    }
}

/// `SHOW COLUMNS` fields arrive as text or raw bytes depending on the server
/// version; accept either.
fn text_field(row: &MySqlRow, column: &str) -> Option<String> {
    if let Ok(value) = row.try_get::<Option<String>, _>(column) {
        return value;
    }
    row.try_get::<Option<Vec<u8>>, _>(column)
        .ok()
        .flatten()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
