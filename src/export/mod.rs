//! SQL dump export.
//!
//! This module turns the rows of a relational database into a file of
//! replayable `INSERT` statements, one banner-delimited section per table,
//! without holding a whole table in memory.

mod catalog;
mod encoder;
mod orchestrator;
pub(crate) mod queries;
mod source;
mod types;
mod writer;

use std::path::{Path, PathBuf};

pub use catalog::SchemaCatalog;
pub use encoder::{encode, encode_value, SqlEncoder};
pub use orchestrator::ExportOrchestrator;
pub use source::{open_row_source, RowSource};
pub use types::{
    ColumnDescriptor, ExportJob, ExportOptions, FailurePolicy, OutputEncoding, RowRecord,
    RunStats, SourceKind, TableDescriptor, TableFailure, TableStats,
};
pub use writer::{closing_banner, delimiter, opening_banner, SectionWriter};

/// Dump file for a full-database export.
///
/// Uses `filename` when given, else `<database>-data.sql` with the database
/// name lowercased, else `dump-data.sql`.
pub fn database_output_path(dir: &Path, filename: Option<&str>, database: Option<&str>) -> PathBuf {
    match (filename, database) {
        (Some(name), _) => dir.join(name),
        (None, Some(db)) if !db.is_empty() => dir.join(format!("{}-data.sql", db.to_lowercase())),
        _ => dir.join(crate::config::DEFAULT_DUMP_FILENAME),
    }
}

/// Dump file for a single-table export: `<table>.sql`, lowercased.
pub fn table_output_path(dir: &Path, table: &str) -> PathBuf {
    dir.join(format!("{}.sql", table.to_lowercase()))
}
