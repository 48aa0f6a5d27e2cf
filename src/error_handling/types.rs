//! Error type definitions.
//!
//! This module defines all error types used throughout the exporter.

use std::path::PathBuf;

use log::SetLoggerError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),
}

/// Error types for an export run.
///
/// `ConfigurationError`, `ConnectionError` and `IntrospectionError` are fatal
/// to the whole run. `QueryError`, `StreamError` and `WriteError` are scoped to
/// one table and are caught by the orchestrator.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum ExportError {
    /// Invalid paths, modes or connection parameters.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The connection pool could not be created.
    #[error("Database connection error: {0}")]
    ConnectionError(#[source] sqlx::Error),

    /// Table or column discovery failed.
    #[error("Schema introspection error: {0}")]
    IntrospectionError(#[source] sqlx::Error),

    /// Count or select query failed for one table.
    #[error("Query error on table \"{table}\": {source}")]
    QueryError {
        /// Table being exported
        table: String,
        /// Underlying driver error
        #[source]
        source: sqlx::Error,
    },

    /// Cursor read failed in the middle of a table.
    #[error("Row stream error on table \"{table}\" after {rows_written} rows: {source}")]
    StreamError {
        /// Table being exported
        table: String,
        /// Rows already written for this table before the failure
        rows_written: u64,
        /// Underlying driver error
        #[source]
        source: sqlx::Error,
    },

    /// The output sink rejected a write.
    #[error("Write error on {}: {source}", path.display())]
    WriteError {
        /// Output file being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Whether this error terminates the whole run rather than a single table.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExportError::ConfigurationError(_)
                | ExportError::ConnectionError(_)
                | ExportError::IntrospectionError(_)
        )
    }
}

/// A configuration field that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid value for '{field}': {message}")]
pub struct ConfigValidationError {
    /// Name of the offending field
    pub field: &'static str,
    /// Actionable description of the problem
    pub message: String,
}

impl ConfigValidationError {
    pub(crate) fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl From<ConfigValidationError> for ExportError {
    fn from(e: ConfigValidationError) -> Self {
        ExportError::ConfigurationError(e.to_string())
    }
}
