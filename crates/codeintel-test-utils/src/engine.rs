//! A scripted engine.

use async_trait::async_trait;
use codeintel_engine::{
    CompletionEntry, EngineClient, EngineError, EngineEvent, EngineRequest, EngineResponse,
    EngineResult, Preferences, RequestContext,
};
use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

struct State {
    languages: Mutex<BTreeSet<String>>,
    available: AtomicBool,
    /// Recorded requests, in arrival order.
    requests: Mutex<Vec<EngineRequest>>,
    environments: Mutex<Vec<(HashMap<String, String>, Preferences)>>,
    /// One-shot responses, consumed in order per context.
    queued: Mutex<HashMap<RequestContext, VecDeque<Result<EngineResponse, String>>>>,
    /// Response when nothing is queued for the context.
    defaults: Mutex<HashMap<RequestContext, EngineResponse>>,
    /// `true` while responses may be delivered.
    gate: watch::Sender<bool>,
    events: broadcast::Sender<EngineEvent>,
}

/// An [`EngineClient`] that records requests and answers from a script.
///
/// Responses can be held back with [`MockEngine::hold`] to simulate a slow
/// engine, and events published with [`MockEngine::emit`].
///
/// # Example
///
/// ```rust
/// use codeintel_engine::{EngineClient, EngineResponse, RequestContext};
/// use codeintel_test_utils::MockEngine;
///
/// let engine = MockEngine::new()
///     .with_completions(vec![("function", "foo"), ("variable", "bar")])
///     .with_response(RequestContext::Trigger, EngineResponse::None);
/// assert!(engine.languages().contains("Python"));
/// ```
#[derive(Clone)]
pub struct MockEngine {
    state: Arc<State>,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// An available engine for Python, PHP and JavaScript that answers
    /// scans with `Scanned` and everything else with `None`.
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        let (events, _) = broadcast::channel(64);
        let defaults = HashMap::from([(RequestContext::Scan, EngineResponse::Scanned)]);
        Self {
            state: Arc::new(State {
                languages: Mutex::new(
                    ["Python", "PHP", "JavaScript"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                ),
                available: AtomicBool::new(true),
                requests: Mutex::new(Vec::new()),
                environments: Mutex::new(Vec::new()),
                queued: Mutex::new(HashMap::new()),
                defaults: Mutex::new(defaults),
                gate,
                events,
            }),
        }
    }

    /// Replace the supported languages.
    pub fn with_languages(self, languages: &[&str]) -> Self {
        *self.state.languages.lock() = languages.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Queue a response for the next request with `context`.
    pub fn with_response(self, context: RequestContext, response: EngineResponse) -> Self {
        self.push(context, Ok(response));
        self
    }

    /// Queue a failure for the next request with `context`.
    pub fn with_error(self, context: RequestContext, message: impl Into<String>) -> Self {
        self.push(context, Err(message.into()));
        self
    }

    /// Answer every request with `context` with `response` unless
    /// something is queued.
    pub fn with_default(self, context: RequestContext, response: EngineResponse) -> Self {
        self.state.defaults.lock().insert(context, response);
        self
    }

    /// Answer triggers with these `(kind, name)` completions by default.
    pub fn with_completions(self, entries: Vec<(&str, &str)>) -> Self {
        let entries = entries
            .into_iter()
            .map(|(kind, name)| CompletionEntry::new(kind, name))
            .collect();
        self.with_default(
            RequestContext::Trigger,
            EngineResponse::Completions {
                trigger_type: None,
                entries,
            },
        )
    }

    pub fn unavailable(self) -> Self {
        self.set_available(false);
        self
    }

    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    /// Queue a response on an engine already handed out.
    pub fn push_response(&self, context: RequestContext, response: EngineResponse) {
        self.push(context, Ok(response));
    }

    fn push(&self, context: RequestContext, response: Result<EngineResponse, String>) {
        self.state
            .queued
            .lock()
            .entry(context)
            .or_default()
            .push_back(response);
    }

    /// Stop delivering responses until [`MockEngine::release`].
    pub fn hold(&self) {
        self.state.gate.send_replace(false);
    }

    /// Deliver held and future responses.
    pub fn release(&self) {
        self.state.gate.send_replace(true);
    }

    /// Publish an engine event. Returns the number of subscribers reached.
    pub fn emit(&self, event: EngineEvent) -> usize {
        self.state.events.send(event).unwrap_or(0)
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<EngineRequest> {
        self.state.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.requests.lock().len()
    }

    /// Requests received with `context`.
    pub fn requests_for(&self, context: RequestContext) -> Vec<EngineRequest> {
        self.state
            .requests
            .lock()
            .iter()
            .filter(|r| r.context == context)
            .cloned()
            .collect()
    }

    pub fn last_request(&self) -> Option<EngineRequest> {
        self.state.requests.lock().last().cloned()
    }

    pub fn clear_requests(&self) {
        self.state.requests.lock().clear();
    }

    /// Environments passed to `set_global_environment`.
    pub fn environments(&self) -> Vec<(HashMap<String, String>, Preferences)> {
        self.state.environments.lock().clone()
    }
}

#[async_trait]
impl EngineClient for MockEngine {
    fn is_available(&self) -> bool {
        self.state.available.load(Ordering::SeqCst)
    }

    fn languages(&self) -> BTreeSet<String> {
        self.state.languages.lock().clone()
    }

    async fn set_global_environment(
        &self,
        env: HashMap<String, String>,
        preferences: Preferences,
    ) -> EngineResult<()> {
        if !self.is_available() {
            return Err(EngineError::Unavailable);
        }
        self.state.environments.lock().push((env, preferences));
        Ok(())
    }

    async fn submit(&self, request: EngineRequest) -> EngineResult<EngineResponse> {
        if !self.is_available() {
            return Err(EngineError::Unavailable);
        }
        let context = request.context;
        self.state.requests.lock().push(request);

        // Pick the answer now so held responses keep request order
        let queued = self
            .state
            .queued
            .lock()
            .get_mut(&context)
            .and_then(VecDeque::pop_front);
        let answer = match queued {
            Some(answer) => answer,
            None => Ok(self
                .state
                .defaults
                .lock()
                .get(&context)
                .cloned()
                .unwrap_or(EngineResponse::None)),
        };

        let mut gate = self.state.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        answer.map_err(EngineError::request_failed)
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.state.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(context: RequestContext) -> EngineRequest {
        EngineRequest {
            language: "Python".to_string(),
            path: "/a.py".to_string(),
            text: String::new(),
            cursor_byte_pos: 0,
            preferences: Preferences::default(),
            context,
        }
    }

    #[tokio::test]
    async fn test_queued_then_default() {
        let engine = MockEngine::new()
            .with_response(RequestContext::Trigger, EngineResponse::CallTip { text: "f(a)".into() })
            .with_completions(vec![("function", "f")]);

        let first = engine.submit(request(RequestContext::Trigger)).await.unwrap();
        assert!(matches!(first, EngineResponse::CallTip { .. }));
        let second = engine.submit(request(RequestContext::Trigger)).await.unwrap();
        assert!(matches!(second, EngineResponse::Completions { .. }));
        let scan = engine.submit(request(RequestContext::Scan)).await.unwrap();
        assert_eq!(scan, EngineResponse::Scanned);
        assert_eq!(engine.request_count(), 3);
        assert_eq!(engine.requests_for(RequestContext::Scan).len(), 1);
    }

    #[tokio::test]
    async fn test_error_and_unavailable() {
        let engine = MockEngine::new().with_error(RequestContext::DefinitionTrigger, "boom");
        let err = engine
            .submit(request(RequestContext::DefinitionTrigger))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Request failed: boom");

        engine.set_available(false);
        let err = engine.submit(request(RequestContext::Scan)).await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable));
        assert_eq!(engine.request_count(), 1);
    }

    #[tokio::test]
    async fn test_hold_and_release() {
        let engine = MockEngine::new();
        engine.hold();

        let pending = tokio::spawn({
            let engine = engine.clone();
            async move { engine.submit(request(RequestContext::Scan)).await }
        });
        tokio::task::yield_now().await;
        assert_eq!(engine.request_count(), 1);
        assert!(!pending.is_finished());

        engine.release();
        assert_eq!(pending.await.unwrap().unwrap(), EngineResponse::Scanned);
    }

    #[tokio::test]
    async fn test_emit_reaches_subscribers() {
        let engine = MockEngine::new();
        assert_eq!(engine.emit(EngineEvent::error("lost")), 0);

        let mut events = engine.subscribe();
        assert_eq!(engine.emit(EngineEvent::progress(1, None)), 1);
        assert_eq!(events.recv().await.unwrap(), EngineEvent::progress(1, None));
    }
}
