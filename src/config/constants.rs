//! Configuration constants.
//!
//! Defaults for the export run and the names of the environment variables the
//! database settings are read from.

/// Rows per cursor fetch, and the row count above which a table is streamed
/// instead of read in one query.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// Connections in the pool. Tables are exported one at a time, so a small
/// pool is enough.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 2;

/// Output file used for a full-database export when no database name is known.
pub const DEFAULT_DUMP_FILENAME: &str = "dump-data.sql";

/// Full connection URL; takes precedence over the individual settings below.
pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_DATABASE_HOST: &str = "DATABASE_HOST";
pub const ENV_DATABASE_PORT: &str = "DATABASE_PORT";
pub const ENV_DATABASE_NAME: &str = "DATABASE_NAME";
pub const ENV_DATABASE_USERNAME: &str = "DATABASE_USERNAME";
pub const ENV_DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";
