//! PostgreSQL gateway.
//!
//! Large tables are read through a server-side cursor declared inside a
//! transaction, so the server hands rows over one `FETCH FORWARD n` at a time.

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use log::debug;
use sqlx::postgres::{PgPool, Postgres};
use sqlx::{Row, Transaction};

use super::{decode_text_row, DatabaseGateway, Dialect};
use crate::export::{ColumnDescriptor, RowRecord};

const CURSOR_NAME: &str = "sql_exporter_cursor";

const LIST_TABLES: &str = "SELECT table_name::text
     FROM information_schema.tables
     WHERE table_type = 'BASE TABLE'
       AND table_schema = 'public'
     ORDER BY table_name";

const DESCRIBE_COLUMNS: &str = "SELECT column_name::text AS column_name,
            data_type::text AS data_type,
            is_nullable::text AS is_nullable
     FROM information_schema.columns
     WHERE table_schema = 'public'
       AND table_name = $1
     ORDER BY ordinal_position";

/// Gateway over a PostgreSQL pool, restricted to the `public` schema.
pub struct PostgresGateway {
    pool: PgPool,
}

impl PostgresGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

enum CursorState {
    Pending(PgPool, String),
    Open(Transaction<'static, Postgres>),
    Exhausted,
}

async fn fetch_forward(
    mut tx: Transaction<'static, Postgres>,
    batch_size: usize,
) -> Result<Option<(Vec<RowRecord>, CursorState)>, sqlx::Error> {
    let fetch = format!("FETCH FORWARD {batch_size} FROM {CURSOR_NAME}");
    let rows = sqlx::query(&fetch).fetch_all(&mut *tx).await?;
    let records = rows
        .iter()
        .map(decode_text_row)
        .collect::<Result<Vec<_>, _>>()?;
    debug!("Fetched cursor batch of {} rows", records.len());

    if records.len() < batch_size {
        let close = format!("CLOSE {CURSOR_NAME}");
        sqlx::query(&close).execute(&mut *tx).await?;
        tx.commit().await?;
        if records.is_empty() {
            return Ok(None);
        }
        return Ok(Some((records, CursorState::Exhausted)));
    }

    Ok(Some((records, CursorState::Open(tx))))
}

#[async_trait]
impl DatabaseGateway for PostgresGateway {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
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
                let nullable: String = r.try_get("is_nullable")?;
                Ok(ColumnDescriptor::new(
                    r.try_get::<String, _>("column_name")?,
                    r.try_get::<String, _>("data_type")?,
                    nullable.eq_ignore_ascii_case("YES"),
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
        rows.iter().map(decode_text_row).collect()
    }

    fn open_cursor(
        &self,
        sql: String,
        batch_size: usize,
    ) -> BoxStream<'static, Result<RowRecord, sqlx::Error>> {
        let batch_size = batch_size.max(1);
        let initial = CursorState::Pending(self.pool.clone(), sql);

        stream::try_unfold(initial, move |state| async move {
            match state {
                CursorState::Pending(pool, sql) => {
                    let mut tx = pool.begin().await?;
                    let declare = format!("DECLARE {CURSOR_NAME} NO SCROLL CURSOR FOR {sql}");
                    sqlx::query(&declare).execute(&mut *tx).await?;
                    fetch_forward(tx, batch_size).await
                }
                CursorState::Open(tx) => fetch_forward(tx, batch_size).await,
                CursorState::Exhausted => Ok(None),
            }
        })
        .map_ok(|batch| stream::iter(batch.into_iter().map(Ok)))
        .try_flatten()
        .boxed()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
