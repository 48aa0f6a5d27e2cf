//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::constants::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_CONNECTIONS};
use crate::config::database::DatabaseConfig;
use crate::error_handling::ConfigValidationError;
use crate::export::{
    database_output_path, table_output_path, ExportOptions, FailurePolicy, OutputEncoding,
};

/// How much the exporter says while it works.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum VerbosityMode {
    /// Errors and warnings only
    Quiet,
    /// Every progress and diagnostic line
    Debug,
}

impl From<VerbosityMode> for log::LevelFilter {
    fn from(mode: VerbosityMode) -> Self {
        match mode {
            VerbosityMode::Quiet => log::LevelFilter::Warn,
            VerbosityMode::Debug => log::LevelFilter::Debug,
        }
    }
}

/// Log output format.
///
/// Controls how log messages are formatted:
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// What a run exports.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Every table of the database, minus exclusions
    Database,
    /// One named table
    Table(String),
}

/// Command-line options.
#[derive(Debug, Parser)]
#[command(
    name = "sql_exporter",
    about = "Dump database tables into a file of SQL INSERT statements."
)]
pub struct Opt {
    /// Env file holding the DATABASE_* connection settings
    #[arg(long, value_parser)]
    pub env: Option<PathBuf>,

    /// Existing directory the dump file is written to
    #[arg(long, value_parser)]
    pub output: PathBuf,

    /// Dump filename for a full-database export (default: <database>-data.sql)
    #[arg(long)]
    pub filename: Option<String>,

    /// Export only this table, into <table>.sql
    #[arg(long)]
    pub table: Option<String>,

    /// Verbosity: quiet shows errors and warnings, debug shows everything
    #[arg(long, value_enum, default_value_t = VerbosityMode::Quiet)]
    pub mode: VerbosityMode,

    /// Log format: plain or json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Rows per cursor fetch; larger tables are streamed
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    /// Comma-separated tables to leave out of a full-database export
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// Output text encoding
    #[arg(long, default_value = "utf-8")]
    pub encoding: String,

    /// What to do when a table fails: abort the run or continue with the next table
    #[arg(long, value_enum, default_value_t = FailurePolicy::Abort)]
    pub on_table_error: FailurePolicy,

    /// Maximum database connections
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use sql_exporter::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     output_dir: PathBuf::from("./dumps"),
///     table: Some("users".to_string()),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the dump file is written to
    pub output_dir: PathBuf,

    /// Dump filename override for full-database exports
    pub filename: Option<String>,

    /// Single table to export; `None` exports the whole database
    pub table: Option<String>,

    /// Tables left out of a full-database export
    pub exclude: Vec<String>,

    /// Connection settings
    pub database: DatabaseConfig,

    pub mode: VerbosityMode,

    pub log_format: LogFormat,

    /// Rows per cursor fetch
    pub batch_size: usize,

    /// Output text encoding, by name
    pub encoding: String,

    pub failure_policy: FailurePolicy,

    /// Maximum database connections
    pub max_connections: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename: None,
            table: None,
            exclude: Vec::new(),
            database: DatabaseConfig::default(),
            mode: VerbosityMode::Quiet,
            log_format: LogFormat::Plain,
            batch_size: DEFAULT_BATCH_SIZE,
            encoding: "utf-8".to_string(),
            failure_policy: FailurePolicy::Abort,
            max_connections: DEFAULT_MAX_CONNECTIONS,
        }
    }
}

impl From<Opt> for Config {
    /// Database settings are left empty; they come from the environment.
    fn from(opt: Opt) -> Self {
        Self {
            output_dir: opt.output,
            filename: opt.filename,
            table: opt.table,
            exclude: opt
                .exclude
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            database: DatabaseConfig::default(),
            mode: opt.mode,
            log_format: opt.log_format,
            batch_size: opt.batch_size,
            encoding: opt.encoding,
            failure_policy: opt.on_table_error,
            max_connections: opt.max_connections,
        }
    }
}

impl Config {
    /// Checks everything that can be checked before connecting.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::new(
                "output",
                "output directory must not be empty",
            ));
        }
        if !self.output_dir.is_dir() {
            return Err(ConfigValidationError::new(
                "output",
                format!(
                    "{} does not exist or is not a directory; create it first",
                    self.output_dir.display()
                ),
            ));
        }

        if let Some(name) = &self.filename {
            if name.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    "filename",
                    "filename must not be empty when given",
                ));
            }
            if name.contains('/') || name.contains('\\') {
                return Err(ConfigValidationError::new(
                    "filename",
                    format!("'{name}' must be a bare file name; use --output for the directory"),
                ));
            }
        }

        if let Some(table) = &self.table {
            if table.trim().is_empty() {
                return Err(ConfigValidationError::new(
                    "table",
                    "table name must not be empty when given",
                ));
            }
        }

        if self.batch_size == 0 {
            return Err(ConfigValidationError::new(
                "batch_size",
                "batch size must be greater than 0",
            ));
        }

        if self.max_connections == 0 {
            return Err(ConfigValidationError::new(
                "max_connections",
                "max connections must be greater than 0",
            ));
        }

        self.output_encoding()?;
        Ok(())
    }

    /// Whole database or a single table, depending on `table`.
    pub fn operation(&self) -> Operation {
        match &self.table {
            Some(table) => Operation::Table(table.clone()),
            None => Operation::Database,
        }
    }

    /// Dump file the run writes.
    pub fn output_path(&self) -> PathBuf {
        match self.operation() {
            Operation::Table(table) => table_output_path(&self.output_dir, &table),
            Operation::Database => database_output_path(
                &self.output_dir,
                self.filename.as_deref(),
                self.database.database_name().as_deref(),
            ),
        }
    }

    pub fn export_options(&self) -> Result<ExportOptions, ConfigValidationError> {
        Ok(ExportOptions {
            batch_size: self.batch_size,
            encoding: self.output_encoding()?,
            failure_policy: self.failure_policy,
        })
    }

    fn output_encoding(&self) -> Result<OutputEncoding, ConfigValidationError> {
        self.encoding.parse::<OutputEncoding>().map_err(|_| {
            ConfigValidationError::new(
                "encoding",
                format!("unsupported encoding '{}'; only utf-8 is supported", self.encoding),
            )
        })
    }
}
