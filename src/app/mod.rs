//! Application-level helpers shared by the library entry point and the binary.

pub mod statistics;
