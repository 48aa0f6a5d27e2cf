//! Database connection pool management.
//!
//! One pool is created per run and shared by every table's data fetches.
//! SQLite databases are opened read-only and never created.

use std::str::FromStr;

use log::{error, info};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::error_handling::ExportError;

/// Initializes a PostgreSQL connection pool.
pub async fn init_postgres_pool(url: &str, max_connections: u32) -> Result<PgPool, ExportError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(url)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            ExportError::ConnectionError(e)
        })?;

    info!("Connected to PostgreSQL.");
    Ok(pool)
}

/// Initializes a SQLite connection pool in read-only mode.
///
/// Fails if the database file does not exist.
pub async fn init_sqlite_pool(url: &str, max_connections: u32) -> Result<SqlitePool, ExportError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| {
            error!("Invalid SQLite URL: {e}");
            ExportError::ConfigurationError(format!("invalid SQLite URL '{url}': {e}"))
        })?
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(options)
        .await
        .map_err(|e| {
            error!("Failed to connect to database: {e}");
            ExportError::ConnectionError(e)
        })?;

    info!("Connected to SQLite.");
    Ok(pool)
}
