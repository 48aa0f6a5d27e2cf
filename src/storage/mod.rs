// storage/mod.rs
// Database access: the gateway seam and its sqlx backends

pub mod pool;
mod postgres;
mod sqlite;
#[cfg(test)]
pub(crate) mod test_helpers;

use async_trait::async_trait;
use futures::stream::BoxStream;
use sqlx::{Column, ColumnIndex, Decode, Row};

use crate::error_handling::ExportError;
use crate::export::{ColumnDescriptor, RowRecord};

pub use pool::{init_postgres_pool, init_sqlite_pool};
pub use postgres::PostgresGateway;
pub use sqlite::SqliteGateway;

/// SQL flavour spoken by a gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    Sqlite,
}

impl Dialect {
    /// Picks the dialect from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let lower = url.trim().to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            Some(Dialect::Postgres)
        } else if lower.starts_with("sqlite:") {
            Some(Dialect::Sqlite)
        } else {
            None
        }
    }
}

/// Everything the exporter needs from a database.
///
/// Implementations own a connection pool shared by all tables of a run.
/// `open_cursor` must be lazy: nothing is fetched until the stream is polled,
/// and no more than `batch_size` rows are held at a time.
#[async_trait]
pub trait DatabaseGateway: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Base tables of the default application schema, sorted by name.
    async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error>;

    /// Columns of `table` in ordinal position. Unknown tables yield an empty list.
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, sqlx::Error>;

    /// Runs a single-value COUNT query.
    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error>;

    /// Runs a query and materializes every row.
    async fn execute(&self, sql: &str) -> Result<Vec<RowRecord>, sqlx::Error>;

    /// Runs a query through a cursor, fetching `batch_size` rows per round-trip.
    fn open_cursor(
        &self,
        sql: String,
        batch_size: usize,
    ) -> BoxStream<'static, Result<RowRecord, sqlx::Error>>;

    /// Releases the connection pool.
    async fn close(&self);
}

/// Connects to the database named by `url` and returns the matching gateway.
pub async fn connect_gateway(
    url: &str,
    max_connections: u32,
) -> Result<Box<dyn DatabaseGateway>, ExportError> {
    match Dialect::from_url(url) {
        Some(Dialect::Postgres) => {
            let pool = init_postgres_pool(url, max_connections).await?;
            Ok(Box::new(PostgresGateway::new(pool)))
        }
        Some(Dialect::Sqlite) => {
            let pool = init_sqlite_pool(url, max_connections).await?;
            Ok(Box::new(SqliteGateway::new(pool)))
        }
        None => Err(ExportError::ConfigurationError(
            "database URL must start with postgres://, postgresql:// or sqlite:".to_string(),
        )),
    }
}

/// Decodes a row whose columns were all cast to text.
pub(crate) fn decode_text_row<R>(row: &R) -> Result<RowRecord, sqlx::Error>
where
    R: Row,
    usize: ColumnIndex<R>,
    for<'r> String: Decode<'r, R::Database>,
{
    let mut record = RowRecord::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let value: Option<String> = row.try_get_unchecked(i)?;
        record.push(column.name(), value);
    }
    Ok(record)
}
