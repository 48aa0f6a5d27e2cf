//! Export orchestration.
//!
//! Drives a run: discover tables, describe them, then export each table in
//! turn (count, choose a row source, opening banner, rows, closing banner).
//! Tables are processed strictly one after another so that every table's
//! section lands in the dump file as one contiguous block.

use std::path::Path;
use std::time::Instant;

use log::{debug, error, info, warn};
use tokio::io::AsyncWrite;

use crate::app::statistics::log_run_summary;
use crate::error_handling::ExportError;
use crate::export::catalog::SchemaCatalog;
use crate::export::encoder::SqlEncoder;
use crate::export::queries::{count_rows_sql, select_rows_sql};
use crate::export::source::{open_row_source, RowSource};
use crate::export::types::{
    ExportJob, ExportOptions, FailurePolicy, RunStats, SourceKind, TableDescriptor, TableStats,
};
use crate::export::writer::{closing_banner, opening_banner, prepare_output, SectionWriter};
use crate::storage::DatabaseGateway;

/// Runs exports against one gateway.
///
/// The gateway's pool is released when an export finishes, whatever the
/// outcome, so an orchestrator serves a single run.
pub struct ExportOrchestrator {
    gateway: Box<dyn DatabaseGateway>,
    options: ExportOptions,
}

impl ExportOrchestrator {
    /// A batch size of 0 is treated as 1.
    pub fn new(gateway: Box<dyn DatabaseGateway>, mut options: ExportOptions) -> Self {
        if options.batch_size == 0 {
            warn!("Batch size 0 is not usable, reading 1 row per batch");
            options.batch_size = 1;
        }
        Self { gateway, options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Exports every table of the default schema except `exclude` into `output`.
    ///
    /// Per-table failures are logged and recorded in the returned stats; what
    /// happens next depends on the configured [`FailurePolicy`]. Only
    /// configuration and introspection failures are returned as errors.
    pub async fn export_database(
        &self,
        exclude: &[String],
        output: &Path,
    ) -> Result<RunStats, ExportError> {
        let result = self.run_database(exclude, output).await;
        self.gateway.close().await;
        info!("Export completed.");
        result
    }

    /// Exports a single table into `output`, introspecting only that table.
    pub async fn export_table(&self, table: &str, output: &Path) -> Result<RunStats, ExportError> {
        let result = self.run_table(table, output).await;
        self.gateway.close().await;
        info!("Export completed.");
        result
    }

    async fn run_database(&self, exclude: &[String], output: &Path) -> Result<RunStats, ExportError> {
        let mut stats = RunStats::new(output.to_path_buf());
        info!("STARTED: {}", stats.started_at);

        let catalog = SchemaCatalog::new(&*self.gateway);
        let tables = catalog.discover_tables().await?;

        for name in exclude {
            if !tables.contains(name) {
                warn!("Excluded table \"{name}\" does not exist");
            }
        }
        let selected: Vec<String> = tables
            .into_iter()
            .filter(|t| !exclude.contains(t))
            .collect();
        let descriptors = catalog.describe_tables(&selected).await?;

        prepare_sink(output).await?;
        self.process_tables(&descriptors, output, &mut stats).await;

        stats.finish();
        log_run_summary(&stats);
        Ok(stats)
    }

    async fn run_table(&self, table: &str, output: &Path) -> Result<RunStats, ExportError> {
        let mut stats = RunStats::new(output.to_path_buf());
        info!("STARTED: {}", stats.started_at);

        let columns = SchemaCatalog::new(&*self.gateway)
            .discover_columns(table)
            .await?;
        let descriptor = TableDescriptor::new(table, columns);

        prepare_sink(output).await?;
        self.process_tables(std::slice::from_ref(&descriptor), output, &mut stats)
            .await;

        stats.finish();
        log_run_summary(&stats);
        Ok(stats)
    }

    async fn process_tables(&self, tables: &[TableDescriptor], output: &Path, stats: &mut RunStats) {
        for (i, table) in tables.iter().enumerate() {
            info!("{}", "#".repeat(50));
            match self.process_table(table, output).await {
                Ok(table_stats) => stats.record_table(table_stats),
                Err(e) => {
                    error!("Failed to export table \"{}\": {e}", table.name);
                    stats.record_failure(&table.name, &e);
                    if self.options.failure_policy == FailurePolicy::Abort {
                        let skipped = tables.len() - i - 1;
                        if skipped > 0 {
                            warn!("Aborting export, {skipped} remaining table(s) skipped");
                        }
                        stats.aborted = true;
                        break;
                    }
                }
            }
        }
    }

    async fn process_table(&self, table: &TableDescriptor, output: &Path) -> Result<TableStats, ExportError> {
        info!("Processing table: {}", table.name);

        let count = self
            .gateway
            .fetch_count(&count_rows_sql(&table.name))
            .await
            .map_err(|source| ExportError::QueryError {
                table: table.name.clone(),
                source,
            })?;
        let row_count = u64::try_from(count).unwrap_or_default();
        info!("rows: {row_count}");

        let job = ExportJob {
            table,
            batch_size: self.options.batch_size,
            encoding: self.options.encoding,
            row_count,
            source: SourceKind::for_row_count(row_count, self.options.batch_size),
            output,
        };
        debug!(
            "Reading \"{}\" through a {} source (batch size {}, {})",
            table.name, job.source, job.batch_size, job.encoding
        );

        let sql = select_rows_sql(self.gateway.dialect(), &table.name, &table.columns);
        let mut source = open_row_source(&*self.gateway, sql, job.source, job.batch_size)
            .await
            .map_err(|source| ExportError::QueryError {
                table: table.name.clone(),
                source,
            })?;

        let mut writer = SectionWriter::append_to(output)
            .await
            .map_err(|source| ExportError::WriteError {
                path: output.to_path_buf(),
                source,
            })?;

        let result = write_table(&job, &mut source, &mut writer).await;
        if result.is_err() {
            // Keep whatever was written before the failure
            if let Err(e) = writer.flush().await {
                warn!("Failed to flush partial output for \"{}\": {e}", table.name);
            }
        }
        result
    }
}

async fn write_table<W: AsyncWrite + Unpin>(
    job: &ExportJob<'_>,
    source: &mut RowSource,
    writer: &mut SectionWriter<W>,
) -> Result<TableStats, ExportError> {
    let table = &job.table.name;
    let write_err = |source: std::io::Error| ExportError::WriteError {
        path: job.output.to_path_buf(),
        source,
    };

    writer
        .write_banner(&opening_banner(table))
        .await
        .map_err(write_err)?;

    let start = Instant::now();
    let encoder = SqlEncoder::new(table, &job.table.columns);
    let mut written: u64 = 0;

    while let Some(row) = source.next_row().await {
        let row = row.map_err(|source| ExportError::StreamError {
            table: table.clone(),
            rows_written: written,
            source,
        })?;
        writer
            .write_statement(&encoder.encode(&row))
            .await
            .map_err(write_err)?;
        written += 1;

        if job.source == SourceKind::Streamed && written % job.batch_size as u64 == 0 {
            debug!("\"{table}\": {written}/{} rows written", job.row_count);
        }
    }
    let elapsed = start.elapsed();

    if written != job.row_count {
        warn!(
            "\"{table}\": counted {} rows but exported {written}",
            job.row_count
        );
    }

    writer
        .write_banner(&closing_banner(written, elapsed))
        .await
        .map_err(write_err)?;
    writer.flush().await.map_err(write_err)?;

    info!(
        "{written} rows exported from \"{table}\" in {:.3} sec(s)",
        elapsed.as_secs_f64()
    );

    Ok(TableStats {
        table: table.clone(),
        row_count: written,
        elapsed,
    })
}

async fn prepare_sink(output: &Path) -> Result<(), ExportError> {
    prepare_output(output).await.map_err(|e| {
        ExportError::ConfigurationError(format!(
            "cannot prepare output file {}: {e}",
            output.display()
        ))
    })
}
