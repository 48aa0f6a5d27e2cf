//! Row sources.
//!
//! A table is read either from a result set fetched in one query (buffered)
//! or through a cursor that pulls one batch at a time (streamed). The choice
//! is made once per table from its row count.

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::export::types::{RowRecord, SourceKind};
use crate::storage::DatabaseGateway;

/// Ordered, finite, single-pass sequence of rows for one table.
pub enum RowSource {
    Buffered(std::vec::IntoIter<RowRecord>),
    Streamed(BoxStream<'static, Result<RowRecord, sqlx::Error>>),
}

impl RowSource {
    pub fn kind(&self) -> SourceKind {
        match self {
            RowSource::Buffered(_) => SourceKind::Buffered,
            RowSource::Streamed(_) => SourceKind::Streamed,
        }
    }

    /// Pulls the next row. Callers stop at the first error.
    pub async fn next_row(&mut self) -> Option<Result<RowRecord, sqlx::Error>> {
        match self {
            RowSource::Buffered(rows) => rows.next().map(Ok),
            RowSource::Streamed(stream) => stream.next().await,
        }
    }
}

impl std::fmt::Debug for RowSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowSource::Buffered(rows) => write!(f, "RowSource::Buffered({} rows left)", rows.len()),
            RowSource::Streamed(_) => f.write_str("RowSource::Streamed"),
        }
    }
}

/// Builds the row source for `kind`.
///
/// The buffered variant runs its query here, so a select failure surfaces
/// immediately. The streamed variant is lazy and reports failures from the
/// first pull.
pub async fn open_row_source(
    gateway: &dyn DatabaseGateway,
    sql: String,
    kind: SourceKind,
    batch_size: usize,
) -> Result<RowSource, sqlx::Error> {
    match kind {
        SourceKind::Buffered => {
            let rows = gateway.execute(&sql).await?;
            Ok(RowSource::Buffered(rows.into_iter()))
        }
        SourceKind::Streamed => Ok(RowSource::Streamed(gateway.open_cursor(sql, batch_size))),
    }
}
