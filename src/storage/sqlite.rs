//! SQLite gateway.
//!
//! SQLite has no server-side cursors. A streamed read runs the query once on a
//! background task that hands rows over in `batch_size` chunks through a
//! bounded channel, so the whole read sees one snapshot and only a couple of
//! batches are in memory at a time.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryChunksError, TryStreamExt};
use log::debug;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Column, Row};
use tokio::sync::mpsc;

use super::{DatabaseGateway, Dialect};
use crate::export::{ColumnDescriptor, RowRecord};

const LIST_TABLES: &str = "SELECT name FROM sqlite_master
     WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
     ORDER BY name";

const DESCRIBE_COLUMNS: &str = "SELECT name, type, \"notnull\" FROM pragma_table_info(?) ORDER BY cid";

/// Gateway over a SQLite pool.
pub struct SqliteGateway {
    pool: SqlitePool,
}

impl SqliteGateway {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DatabaseGateway for SqliteGateway {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(LIST_TABLES)
            .fetch_all(&self.pool)
            .await
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        let rows = sqlx::query(DESCRIBE_COLUMNS)
            .bind(table)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|r| {
                let not_null: i64 = r.try_get("notnull")?;
                Ok(ColumnDescriptor::new(
                    r.try_get::<String, _>("name")?,
                    r.try_get::<String, _>("type")?,
                    not_null == 0,
                ))
            })
            .collect()
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(sql)
            .fetch_one(&self.pool)
            .await
    }

    async fn execute(&self, sql: &str) -> Result<Vec<RowRecord>, sqlx::Error> {
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter().map(decode_row).collect()
    }

    fn open_cursor(
        &self,
        sql: String,
        batch_size: usize,
    ) -> BoxStream<'static, Result<RowRecord, sqlx::Error>> {
        let pool = self.pool.clone();
        let batch_size = batch_size.max(1);

        // Nothing runs until the first poll
        stream::once(async move { spawn_reader(pool, sql, batch_size) })
            .flat_map(|rx| {
                stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|batch| (batch, rx))
                })
            })
            .map_ok(|batch| stream::iter(batch.into_iter().map(Ok)))
            .try_flatten()
            .boxed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

type Batch = Result<Vec<RowRecord>, sqlx::Error>;

/// Runs `sql` once and forwards its rows in chunks of `batch_size`.
///
/// The task stops as soon as the receiver is dropped, releasing its
/// connection. Rows read before an error are delivered ahead of the error.
fn spawn_reader(pool: SqlitePool, sql: String, batch_size: usize) -> mpsc::Receiver<Batch> {
    let (tx, rx) = mpsc::channel(1);

    tokio::spawn(async move {
        let mut batches = sqlx::query(&sql)
            .fetch(&pool)
            .map(|row| row.and_then(|row| decode_row(&row)))
            .try_chunks(batch_size);

        while let Some(batch) = batches.next().await {
            match batch {
                Ok(rows) => {
                    debug!("Fetched batch of {} rows", rows.len());
                    if tx.send(Ok(rows)).await.is_err() {
                        return;
                    }
                }
                Err(TryChunksError(rows, e)) => {
                    if !rows.is_empty() && tx.send(Ok(rows)).await.is_err() {
                        return;
                    }
                    let _ = tx.send(Err(e)).await;
                    return;
                }
            }
        }
    });

    rx
}

/// Decodes a row of text-cast columns.
///
/// Text that is not valid UTF-8 is decoded lossily rather than failing the
/// table: SQLite stores whatever bytes it was given.
fn decode_row(row: &SqliteRow) -> Result<RowRecord, sqlx::Error> {
    let mut record = RowRecord::with_capacity(row.len());
    for (i, column) in row.columns().iter().enumerate() {
        let bytes: Option<Vec<u8>> = row.try_get_unchecked(i)?;
        record.push(
            column.name(),
            bytes.map(|b| String::from_utf8_lossy(&b).into_owned()),
        );
    }
    Ok(record)
}
