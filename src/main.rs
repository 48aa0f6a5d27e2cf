//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `sql_exporter` library that handles:
//! - Command-line argument parsing
//! - Loading database settings from an env file
//! - Logger initialization
//! - User-facing output and exit codes
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use sql_exporter::config::load_env_file;
use sql_exporter::initialization::init_logger_with;
use sql_exporter::{run_export, Config, DatabaseConfig, ExportError, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();

    // An explicit --env file wins; otherwise pick up a .env in the working directory
    match &opt.env {
        Some(path) => exit_on_config_error(load_env_file(path).map_err(ExportError::from)),
        None => {
            let _ = dotenvy::dotenv();
        }
    }

    let mut config = Config::from(opt);
    config.database = exit_on_config_error(DatabaseConfig::from_env().map_err(ExportError::from));
    exit_on_config_error(config.validate().map_err(ExportError::from));

    init_logger_with(config.mode.into(), config.log_format)
        .context("Failed to initialize logger")?;

    match run_export(config).await {
        Ok(report) => {
            println!(
                "Exported {} row{} from {} table{} in {:.1}s into {}",
                report.total_rows,
                if report.total_rows == 1 { "" } else { "s" },
                report.tables_exported,
                if report.tables_exported == 1 { "" } else { "s" },
                report.elapsed_seconds,
                report.output_path.display()
            );
            if !report.is_success() {
                eprintln!(
                    "Failed table{}: {}{}",
                    if report.failed_tables.len() == 1 { "" } else { "s" },
                    report.failed_tables.join(", "),
                    if report.aborted { " (run aborted)" } else { "" }
                );
                process::exit(report.exit_code());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("sql_exporter error: {:#}", e);
            process::exit(1);
        }
    }
}

fn exit_on_config_error<T>(result: Result<T, ExportError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("sql_exporter error: {e}");
            process::exit(1);
        }
    }
}
