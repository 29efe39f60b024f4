//! Logging initialization for the CLI.
//!
//! Command output goes to stdout, so logs go to stderr unless a file is
//! given.

use codeintel_util::log::{self, LogConfig, LogLevel};
use std::path::PathBuf;

/// Initialize logging based on verbosity.
/// Returns the log file path if logging to a file.
pub fn init_logging(verbose: bool, file: Option<PathBuf>) -> Option<PathBuf> {
    log::init(log_config(verbose, file))
}

fn log_config(verbose: bool, file: Option<PathBuf>) -> LogConfig {
    LogConfig {
        print: true,
        level: if verbose { LogLevel::Debug } else { LogLevel::Warn },
        include_location: verbose,
        file,
    }
}
