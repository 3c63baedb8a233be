//! # Loggers
//!
//! `log` facade initialisation for the binaries.

/// fern dispatcher with colored console output and a rotated log file.
pub mod loggerlocal;

pub use loggerlocal::{parse_level, rotate_logs, setup_logging};
