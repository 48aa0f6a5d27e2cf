//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (batch size, environment variable names)
//! - Database connection settings loaded from the environment
//! - CLI option types and the library `Config`

mod constants;
mod database;
mod types;

pub use constants::*;
pub use database::{load_env_file, DatabaseConfig};
pub use types::{Config, LogFormat, Operation, Opt, VerbosityMode};
