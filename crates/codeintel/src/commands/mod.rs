//! Command handlers for the codeintel CLI.

pub mod config;
pub mod console;
pub mod logging;
pub mod query;

pub use config::*;
pub use logging::*;
pub use query::*;
