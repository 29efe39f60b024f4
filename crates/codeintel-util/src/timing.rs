//! Timing of engine round-trips.
//!
//! A [`TimingGuard`] is created when a request is handed to the engine and
//! logs one line when dropped: the request context, the view and language it
//! was made for, how it ended, and how long it took. Quick round-trips are
//! logged at debug so that typing does not flood the log.

use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn, Level};

/// Round-trips at least this long are logged at info.
pub const NOTICEABLE: Duration = Duration::from_millis(250);
/// Round-trips at least this long are logged at warn.
pub const SLOW: Duration = Duration::from_millis(2000);

/// How an engine round-trip ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Dropped before an answer arrived.
    Abandoned,
    Answered,
    Failed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Abandoned => "abandoned",
            Outcome::Answered => "answered",
            Outcome::Failed => "failed",
        }
    }
}

/// Log level for a round-trip of `elapsed`.
pub fn level_for(elapsed: Duration) -> Level {
    if elapsed >= SLOW {
        Level::WARN
    } else if elapsed >= NOTICEABLE {
        Level::INFO
    } else {
        Level::DEBUG
    }
}

/// Logs an engine round-trip when dropped.
pub struct TimingGuard {
    context: &'static str,
    view: String,
    language: String,
    outcome: Outcome,
    start: Instant,
}

impl TimingGuard {
    pub fn engine(context: &'static str, view: impl fmt::Display, language: impl Into<String>) -> Self {
        Self {
            context,
            view: view.to_string(),
            language: language.into(),
            outcome: Outcome::Abandoned,
            start: Instant::now(),
        }
    }

    pub fn answered(&mut self) {
        self.outcome = Outcome::Answered;
    }

    pub fn failed(&mut self) {
        self.outcome = Outcome::Failed;
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }
}

impl Drop for TimingGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let elapsed_ms = elapsed.as_millis() as u64;
        let outcome = self.outcome.as_str();
        match level_for(elapsed) {
            Level::WARN => warn!(
                context = self.context,
                view = %self.view,
                language = %self.language,
                outcome,
                elapsed_ms,
                "Slow engine round-trip"
            ),
            Level::INFO => info!(
                context = self.context,
                view = %self.view,
                language = %self.language,
                outcome,
                elapsed_ms,
                "Engine round-trip"
            ),
            _ => debug!(
                context = self.context,
                view = %self.view,
                language = %self.language,
                outcome,
                elapsed_ms,
                "Engine round-trip"
            ),
        }
    }
}
