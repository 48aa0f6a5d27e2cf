//! Error handling.
//!
//! This module provides the error taxonomy of an export run:
//! - **Fatal errors**: configuration, connection and schema introspection
//!   failures stop the run before any table is written
//! - **Per-table errors**: query, stream and write failures are caught by the
//!   orchestrator, logged, and recorded in the run statistics

mod types;

// Re-export public API
pub use types::{ConfigValidationError, ExportError, InitializationError};
