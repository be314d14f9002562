//! Logging setup for the `getpet` binary.
//!
//! Logs go to stderr; stdout carries only JSON.

use tracing::Level;

use crate::error::{Result, ShelterError};

/// Map CLI verbosity flags to a maximum log level
///
/// `quiet` wins over any verbosity: 0 is INFO, 1 is DEBUG, 2 or more is TRACE.
#[must_use]
pub const fn level_for(verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::INFO,
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

/// Initialize structured logging on stderr
///
/// Fails if a global subscriber is already installed.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level_for(verbose, quiet))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| ShelterError::config_error(format!("Failed to initialize logging: {e}")))
}
