//! Run statistics logging.

use log::{error, info};

use crate::export::RunStats;

/// Logs the end-of-run summary: per-table totals, failures, and the
/// STARTED/FINISHED banner.
pub fn log_run_summary(stats: &RunStats) {
    for table in &stats.tables {
        info!(
            "   {}: {} rows in {:.3}s",
            table.table,
            table.row_count,
            table.elapsed.as_secs_f64()
        );
    }

    if !stats.failures.is_empty() {
        error!("Failed tables ({} total):", stats.failures.len());
        for failure in &stats.failures {
            error!("   {}: {}", failure.table, failure.error);
        }
    }

    info!("{}", "#".repeat(50));
    info!(
        "Exported {} row{} from {} table{} in {:.1}s{}",
        stats.row_count,
        if stats.row_count == 1 { "" } else { "s" },
        stats.tables.len(),
        if stats.tables.len() == 1 { "" } else { "s" },
        stats.elapsed.as_secs_f64(),
        if stats.aborted { " (aborted)" } else { "" }
    );
    info!("FINISHED: {}", chrono::Utc::now());
    info!("{}", "#".repeat(50));
}
