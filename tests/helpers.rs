// Shared test helpers for database setup and failure injection.
//
// This module provides a real SQLite database on disk and a scripted in-memory
// gateway whose tables can be told to fail at a chosen point.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode};
use sqlx::SqlitePool;

use sql_exporter::export::{ColumnDescriptor, RowRecord};
use sql_exporter::storage::{DatabaseGateway, Dialect};

/// Creates a SQLite database file at `path` and returns a writable pool on it.
#[allow(dead_code)] // Used by other test files
pub async fn create_sqlite_db(path: &Path) -> SqlitePool {
    SqlitePool::connect_with(
        SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete),
    )
    .await
    .expect("Failed to create test database")
}

/// Runs each statement against `pool`.
#[allow(dead_code)] // Used by other test files
pub async fn run_statements(pool: &SqlitePool, statements: &[&str]) {
    for sql in statements {
        sqlx::query(sql)
            .execute(pool)
            .await
            .unwrap_or_else(|e| panic!("Failed to run {sql}: {e}"));
    }
}

/// `sqlite:` URL for a database file.
#[allow(dead_code)] // Used by other test files
pub fn sqlite_url(path: &PathBuf) -> String {
    format!("sqlite:{}", path.display())
}

/// What the scripted gateway was asked to do.
#[derive(Default)]
pub struct GatewayCalls {
    pub closed: AtomicBool,
    pub execute_calls: AtomicUsize,
    pub cursor_calls: AtomicUsize,
}

#[allow(dead_code)] // Used by other test files
impl GatewayCalls {
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(Ordering::SeqCst)
    }

    pub fn cursor_calls(&self) -> usize {
        self.cursor_calls.load(Ordering::SeqCst)
    }
}

struct ScriptedTable {
    columns: Vec<ColumnDescriptor>,
    rows: Vec<RowRecord>,
}

/// In-memory gateway with scripted tables and failures.
///
/// Row `i` of a table holds `i` in its first column and `<column>-<i>` in the
/// others.
pub struct ScriptedGateway {
    tables: BTreeMap<String, ScriptedTable>,
    failing_count: Option<String>,
    failing_stream: Option<(String, usize)>,
    reported_count: Option<(String, i64)>,
    calls: Arc<GatewayCalls>,
}

#[allow(dead_code)] // Used by other test files
impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            failing_count: None,
            failing_stream: None,
            reported_count: None,
            calls: Arc::new(GatewayCalls::default()),
        }
    }

    pub fn with_table(mut self, name: &str, columns: &[&str], row_count: usize) -> Self {
        let rows: Vec<RowRecord> = (1..=row_count)
            .map(|i| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(pos, col)| {
                        let value = if pos == 0 {
                            i.to_string()
                        } else {
                            format!("{col}-{i}")
                        };
                        (col.to_string(), Some(value))
                    })
                    .collect::<RowRecord>()
            })
            .collect();
        let columns = columns
            .iter()
            .map(|c| ColumnDescriptor::new(*c, "text", true))
            .collect();
        self.tables
            .insert(name.to_string(), ScriptedTable { columns, rows });
        self
    }

    /// COUNT on `table` fails.
    pub fn failing_count(mut self, table: &str) -> Self {
        self.failing_count = Some(table.to_string());
        self
    }

    /// Reading `table` fails after `after_rows` rows.
    pub fn failing_stream(mut self, table: &str, after_rows: usize) -> Self {
        self.failing_stream = Some((table.to_string(), after_rows));
        self
    }

    /// COUNT on `table` answers `count` whatever the table holds.
    pub fn with_reported_count(mut self, table: &str, count: i64) -> Self {
        self.reported_count = Some((table.to_string(), count));
        self
    }

    pub fn calls(&self) -> Arc<GatewayCalls> {
        Arc::clone(&self.calls)
    }

    fn rows_for(&self, sql: &str) -> Result<(String, Vec<RowRecord>), sqlx::Error> {
        let table = table_in(sql);
        self.tables
            .get(&table)
            .map(|t| (table.clone(), t.rows.clone()))
            .ok_or_else(|| sqlx::Error::Protocol(format!("relation \"{table}\" does not exist")))
    }

    fn stream_failure_point(&self, table: &str) -> Option<usize> {
        self.failing_stream
            .as_ref()
            .filter(|(name, _)| name == table)
            .map(|(_, after)| *after)
    }
}

/// Last double-quoted identifier after `FROM`.
fn table_in(sql: &str) -> String {
    let rest = sql
        .rfind("FROM \"")
        .map(|at| &sql[at + 6..])
        .unwrap_or_default();
    rest.split('"').next().unwrap_or_default().to_string()
}

fn injected_failure() -> sqlx::Error {
    sqlx::Error::Protocol("connection reset by peer".to_string())
}

#[async_trait]
impl DatabaseGateway for ScriptedGateway {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn list_tables(&self) -> Result<Vec<String>, sqlx::Error> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnDescriptor>, sqlx::Error> {
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn fetch_count(&self, sql: &str) -> Result<i64, sqlx::Error> {
        let (table, rows) = self.rows_for(sql)?;
        if self.failing_count.as_deref() == Some(table.as_str()) {
            return Err(injected_failure());
        }
        match &self.reported_count {
            Some((name, count)) if *name == table => Ok(*count),
            _ => Ok(rows.len() as i64),
        }
    }

    async fn execute(&self, sql: &str) -> Result<Vec<RowRecord>, sqlx::Error> {
        self.calls.execute_calls.fetch_add(1, Ordering::SeqCst);
        let (table, rows) = self.rows_for(sql)?;
        if self.stream_failure_point(&table).is_some() {
            return Err(injected_failure());
        }
        Ok(rows)
    }

    fn open_cursor(
        &self,
        sql: String,
        _batch_size: usize,
    ) -> BoxStream<'static, Result<RowRecord, sqlx::Error>> {
        self.calls.cursor_calls.fetch_add(1, Ordering::SeqCst);
        let (table, rows) = match self.rows_for(&sql) {
            Ok(found) => found,
            Err(e) => return stream::once(async move { Err(e) }).boxed(),
        };

        match self.stream_failure_point(&table) {
            Some(after) => stream::iter(rows.into_iter().take(after).map(Ok))
                .chain(stream::once(async { Err(injected_failure()) }))
                .boxed(),
            None => stream::iter(rows.into_iter().map(Ok)).boxed(),
        }
    }

    async fn close(&self) {
        self.calls.closed.store(true, Ordering::SeqCst);
    }
}
