//! Engine running as a child process, spoken to over stdio.

use crate::client::EngineClient;
use crate::error::{EngineError, EngineResult};
use crate::transport::{read_message, write_message, Incoming, WireRequest, WireResponse};
use crate::types::{EngineEvent, EngineRequest, EngineResponse, Preferences};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Event channel capacity.
const EVENT_CAPACITY: usize = 256;

/// How long to wait for the engine to exit on its own after stdin closes.
const EXIT_GRACE: Duration = Duration::from_millis(200);

/// Launch description for the engine process.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineCommand {
    /// Executable to run.
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

impl EngineCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<impl Into<String>>) -> Self {
        self.args = args.into_iter().map(|a| a.into()).collect();
        self
    }
}

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<EngineResult<Value>>>>>;
type Writer = Box<dyn AsyncWrite + Send + Unpin>;

#[derive(Debug, Deserialize)]
struct InitializeResult {
    #[serde(default)]
    languages: Vec<String>,
}

/// Engine connection over a pair of byte streams, usually a child's stdio.
///
/// A background reader task routes responses to their waiting request by id
/// and forwards notifications to subscribers. When the stream ends the
/// engine becomes unavailable and every waiting request fails with
/// [`EngineError::Closed`].
pub struct ProcessEngine {
    writer: Mutex<Option<Writer>>,
    child: Mutex<Option<Child>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    pending: Pending,
    events: broadcast::Sender<EngineEvent>,
    languages: OnceLock<BTreeSet<String>>,
    available: Arc<AtomicBool>,
    next_id: AtomicU64,
}

impl ProcessEngine {
    /// Spawn the engine process and perform the initial handshake.
    pub async fn spawn(command: &EngineCommand, cwd: Option<&Path>) -> EngineResult<Self> {
        let mut cmd = Command::new(&command.command);
        cmd.args(&command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .envs(&command.env)
            .kill_on_drop(true);

        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!(command = %command.command, args = ?command.args, "Starting engine");

        let mut child = cmd
            .spawn()
            .map_err(|e| EngineError::Spawn(format!("{}: {e}", command.command)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::Spawn("Failed to get stdout".to_string()))?;

        let mut engine = Self::connect(BufReader::new(stdout), stdin).await?;
        *engine.child.get_mut() = Some(child);

        info!(
            command = %command.command,
            languages = engine.languages().len(),
            "Engine started"
        );
        Ok(engine)
    }

    /// Attach to an engine over arbitrary streams and perform the handshake.
    pub async fn connect<R, W>(reader: R, writer: W) -> EngineResult<Self>
    where
        R: AsyncBufRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let engine = Self {
            writer: Mutex::new(Some(Box::new(writer))),
            child: Mutex::new(None),
            reader: Mutex::new(None),
            pending: Arc::new(Mutex::new(HashMap::new())),
            events,
            languages: OnceLock::new(),
            available: Arc::new(AtomicBool::new(true)),
            next_id: AtomicU64::new(1),
        };

        let handle = tokio::spawn(read_loop(
            reader,
            Arc::clone(&engine.pending),
            engine.events.clone(),
            Arc::clone(&engine.available),
        ));
        *engine.reader.lock().await = Some(handle);

        engine.initialize().await?;
        Ok(engine)
    }

    async fn initialize(&self) -> EngineResult<()> {
        let result = self
            .call(
                "initialize",
                Some(json!({
                    "client": "codeintel",
                    "version": env!("CARGO_PKG_VERSION"),
                })),
            )
            .await?;
        let init: InitializeResult = serde_json::from_value(result)
            .map_err(|e| EngineError::protocol(format!("Invalid initialize result: {e}")))?;
        let _ = self.languages.set(init.languages.into_iter().collect());
        Ok(())
    }

    fn next_request_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Send a request and wait for the matching response.
    async fn call(&self, method: &str, params: Option<Value>) -> EngineResult<Value> {
        if !self.is_available() {
            return Err(EngineError::Unavailable);
        }

        let id = self.next_request_id();
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        // The reader marks the engine unavailable before failing pending
        // requests, so a request registered after that drain is caught here.
        if !self.is_available() {
            self.pending.lock().await.remove(&id);
            return Err(EngineError::Unavailable);
        }

        let content = serde_json::to_string(&WireRequest::new(id, method, params))?;
        if let Err(e) = self.send(&content).await {
            self.pending.lock().await.remove(&id);
            return Err(e);
        }

        rx.await.map_err(|_| EngineError::Closed)?
    }

    async fn send(&self, content: &str) -> EngineResult<()> {
        let mut writer_guard = self.writer.lock().await;
        let writer = writer_guard.as_mut().ok_or(EngineError::Closed)?;
        write_message(writer.as_mut(), content).await
    }

    /// Shut the engine down.
    pub async fn close(&self) -> EngineResult<()> {
        self.available.store(false, Ordering::SeqCst);

        // Closing stdin asks the engine to exit.
        *self.writer.lock().await = None;

        if let Some(mut child) = self.child.lock().await.take() {
            if tokio::time::timeout(EXIT_GRACE, child.wait()).await.is_err() {
                let _ = child.kill().await;
            }
        }

        if let Some(reader) = self.reader.lock().await.take() {
            reader.abort();
        }
        fail_pending(&self.pending).await;

        debug!("Closed engine connection");
        Ok(())
    }
}

#[async_trait]
impl EngineClient for ProcessEngine {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn languages(&self) -> BTreeSet<String> {
        self.languages.get().cloned().unwrap_or_default()
    }

    async fn set_global_environment(
        &self,
        env: HashMap<String, String>,
        prefs: Preferences,
    ) -> EngineResult<()> {
        self.call(
            "setEnvironment",
            Some(json!({ "env": env, "preferences": prefs })),
        )
        .await
        .map(|_| ())
    }

    async fn submit(&self, request: EngineRequest) -> EngineResult<EngineResponse> {
        let result = self
            .call("submit", Some(serde_json::to_value(&request)?))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| EngineError::protocol(format!("Invalid submit result: {e}")))
    }

    fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }
}

impl Drop for ProcessEngine {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.reader.try_lock() {
            if let Some(reader) = guard.take() {
                reader.abort();
            }
        }
    }
}

async fn read_loop<R>(
    mut reader: R,
    pending: Pending,
    events: broadcast::Sender<EngineEvent>,
    available: Arc<AtomicBool>,
) where
    R: AsyncBufRead + Send + Unpin,
{
    loop {
        match read_message(&mut reader).await {
            Ok(Some(content)) => dispatch(&content, &pending, &events).await,
            Ok(None) => {
                debug!("Engine closed its output");
                break;
            }
            Err(e) => {
                warn!(error = %e, "Engine stream failed");
                break;
            }
        }
    }

    available.store(false, Ordering::SeqCst);
    fail_pending(&pending).await;
}

async fn dispatch(content: &str, pending: &Pending, events: &broadcast::Sender<EngineEvent>) {
    match Incoming::parse(content) {
        Ok(Incoming::Response(response)) => {
            let id = response.id;
            let Some(tx) = pending.lock().await.remove(&id) else {
                debug!(id, "Response for unknown request");
                return;
            };
            let _ = tx.send(into_result(response));
        }
        Ok(Incoming::Event(event)) => {
            // No subscribers is fine.
            let _ = events.send(event);
        }
        Err(e) => {
            warn!(error = %e, "Dropping malformed engine message");
        }
    }
}

fn into_result(response: WireResponse) -> EngineResult<Value> {
    match response.error {
        Some(error) => {
            if let Some(stack) = &error.stack {
                debug!(stack = %stack, "Engine request failed");
            }
            Err(EngineError::request_failed(error.message))
        }
        None => Ok(response.result.unwrap_or(Value::Null)),
    }
}

async fn fail_pending(pending: &Pending) {
    for (_, tx) in pending.lock().await.drain() {
        let _ = tx.send(Err(EngineError::Closed));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_failure() {
        let result = ProcessEngine::spawn(&EngineCommand::new("nonexistent_engine_12345"), None).await;
        assert!(matches!(result, Err(EngineError::Spawn(_))));
    }

    #[test]
    fn test_engine_command_from_json() {
        let command: EngineCommand =
            serde_json::from_str(r#"{"command": "codeintel-server", "args": ["--stdio"]}"#)
                .unwrap();
        assert_eq!(command, EngineCommand::new("codeintel-server").with_args(vec!["--stdio"]));
    }

    #[test]
    fn test_error_response_becomes_request_failed() {
        let response = WireResponse {
            id: 1,
            result: None,
            error: Some(crate::transport::WireError {
                message: "unknown buffer".to_string(),
                stack: None,
            }),
        };
        let err = into_result(response).unwrap_err();
        assert!(matches!(err, EngineError::RequestFailed(m) if m == "unknown buffer"));
    }
}
