//! Shared utilities for codeintel.
//!
//! - Logging setup with tracing
//! - RAII-based timing for engine round-trips

pub mod log;
pub mod timing;

pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
