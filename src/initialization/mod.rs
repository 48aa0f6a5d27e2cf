//! Process-wide initialization.
//!
//! Only logging needs global setup; database pools are created per run by
//! [`crate::storage::connect_gateway`].

mod logger;

pub use logger::init_logger_with;
