//! Export types and options.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::config::DEFAULT_BATCH_SIZE;

/// One column of a table, as reported by the catalog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Declared data type (catalog spelling, e.g. `integer`, `TEXT`)
    pub data_type: String,
    /// Whether the column accepts NULL
    pub nullable: bool,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, nullable: bool) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable,
        }
    }
}

/// A table name plus its columns in ordinal position.
///
/// Built once during schema discovery and never modified afterwards, so the
/// column order is fixed for the whole export of that table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDescriptor>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Column names in declared order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// One row read from a table.
///
/// Fields keep the order of the select list, which is the table's column
/// order. A `None` value is SQL NULL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RowRecord {
    fields: Vec<(String, Option<String>)>,
}

impl RowRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Appends a field. Order of calls is the order of the record.
    pub fn push(&mut self, column: impl Into<String>, value: Option<String>) {
        self.fields.push((column.into(), value));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Looks up a field by column name.
    ///
    /// Returns `None` if the column is absent and `Some(None)` for SQL NULL.
    pub fn get(&self, column: &str) -> Option<Option<&str>> {
        self.position(column, None)
            .map(|i| self.fields[i].1.as_deref())
    }

    /// Textual form of a field: its value, `null` for SQL NULL, or
    /// `undefined` when the row has no such column.
    pub fn text(&self, column: &str) -> Cow<'_, str> {
        self.text_at(column, None)
    }

    /// Same as [`RowRecord::text`] with a positional hint; the hint is
    /// checked first so rows in table order resolve in constant time.
    pub(crate) fn text_at(&self, column: &str, hint: Option<usize>) -> Cow<'_, str> {
        match self.position(column, hint) {
            Some(i) => match &self.fields[i].1 {
                Some(value) => Cow::Borrowed(value.as_str()),
                None => Cow::Borrowed("null"),
            },
            None => Cow::Borrowed("undefined"),
        }
    }

    fn position(&self, column: &str, hint: Option<usize>) -> Option<usize> {
        if let Some(i) = hint {
            if self.fields.get(i).is_some_and(|(name, _)| name == column) {
                return Some(i);
            }
        }
        self.fields.iter().position(|(name, _)| name == column)
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for RowRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Text encoding of the output file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputEncoding {
    #[default]
    Utf8,
}

impl FromStr for OutputEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(OutputEncoding::Utf8),
            other => Err(format!(
                "unsupported encoding '{other}' (supported: utf-8)"
            )),
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputEncoding::Utf8 => f.write_str("utf-8"),
        }
    }
}

/// What a full-database run does after one table fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Stop at the first failing table (remaining tables are skipped)
    #[default]
    Abort,
    /// Log the failure and move on to the next table
    Continue,
}

/// Options shared by every table of a run.
#[derive(Clone, Debug)]
pub struct ExportOptions {
    /// Row-count threshold for streaming, also the cursor fetch size
    pub batch_size: usize,
    /// Output file encoding
    pub encoding: OutputEncoding,
    /// Behaviour after a per-table failure
    pub failure_policy: FailurePolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            encoding: OutputEncoding::Utf8,
            failure_policy: FailurePolicy::Abort,
        }
    }
}

/// Which row source a table is read through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// Whole result set fetched by one query
    Buffered,
    /// Server-side cursor fetched one batch at a time
    Streamed,
}

impl SourceKind {
    /// Streams when the table holds more rows than one batch.
    pub fn for_row_count(row_count: u64, batch_size: usize) -> Self {
        if row_count > batch_size as u64 {
            SourceKind::Streamed
        } else {
            SourceKind::Buffered
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Buffered => f.write_str("buffered"),
            SourceKind::Streamed => f.write_str("streamed"),
        }
    }
}

/// Per-table state, built when a table starts and dropped when it ends.
#[derive(Debug)]
pub struct ExportJob<'a> {
    pub table: &'a TableDescriptor,
    pub batch_size: usize,
    pub encoding: OutputEncoding,
    pub row_count: u64,
    pub source: SourceKind,
    pub output: &'a std::path::Path,
}

/// Result of one table's export.
#[derive(Clone, Debug, PartialEq)]
pub struct TableStats {
    pub table: String,
    /// INSERT lines written
    pub row_count: u64,
    pub elapsed: Duration,
}

/// A table that did not finish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableFailure {
    pub table: String,
    pub error: String,
}

/// Statistics for one run, created at run start and handed back at the end.
#[derive(Clone, Debug)]
pub struct RunStats {
    pub started_at: DateTime<Utc>,
    pub tables: Vec<TableStats>,
    pub failures: Vec<TableFailure>,
    /// Cumulative rows over all successfully exported tables
    pub row_count: u64,
    /// Set when the abort policy stopped the run early
    pub aborted: bool,
    pub elapsed: Duration,
    pub output: PathBuf,
}

impl RunStats {
    pub fn new(output: PathBuf) -> Self {
        Self {
            started_at: Utc::now(),
            tables: Vec::new(),
            failures: Vec::new(),
            row_count: 0,
            aborted: false,
            elapsed: Duration::ZERO,
            output,
        }
    }

    pub fn record_table(&mut self, stats: TableStats) {
        self.row_count += stats.row_count;
        self.tables.push(stats);
    }

    pub fn record_failure(&mut self, table: &str, error: &crate::ExportError) {
        self.failures.push(TableFailure {
            table: table.to_string(),
            error: error.to_string(),
        });
    }

    pub fn table(&self, name: &str) -> Option<&TableStats> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub(crate) fn finish(&mut self) {
        let now = Utc::now();
        self.elapsed = (now - self.started_at).to_std().unwrap_or_default();
    }
}
