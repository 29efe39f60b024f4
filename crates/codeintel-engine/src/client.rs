//! The engine surface consumed by the coordinator.

use crate::error::EngineResult;
use crate::types::{EngineEvent, EngineRequest, EngineResponse, Preferences};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::broadcast;

/// Opaque handle to the code intelligence engine.
///
/// Every call is non-blocking from the caller's point of view: `submit`
/// returns a future that resolves whenever the engine answers, possibly
/// after later requests have already been answered.
#[async_trait]
pub trait EngineClient: Send + Sync {
    /// Whether the engine is up. When this is false the coordinator treats
    /// every operation as a no-op.
    fn is_available(&self) -> bool;

    /// Languages the engine can analyze.
    fn languages(&self) -> BTreeSet<String>;

    /// Push process environment and global preferences to the engine.
    async fn set_global_environment(
        &self,
        env: HashMap<String, String>,
        prefs: Preferences,
    ) -> EngineResult<()>;

    /// Submit a request and wait for its response.
    async fn submit(&self, request: EngineRequest) -> EngineResult<EngineResponse>;

    /// Subscribe to out-of-band notifications (progress, errors, scans).
    fn subscribe(&self) -> broadcast::Receiver<EngineEvent>;
}
