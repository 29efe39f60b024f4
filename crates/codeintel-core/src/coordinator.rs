//! The editor-facing entry points.

use crate::buffer::{Buffer, CurrentLine};
use crate::config::Config;
use crate::editor::{EditOrigin, EditorSurface, ViewId, ViewSnapshot, WindowId};
use crate::format::{policy_for, CompletionItem};
use crate::history::HistoryService;
use crate::notify::{NotificationService, StatusRequest};
use crate::registry::SessionRegistry;
use crate::scheduler::{Scheduler, TokioScheduler};
use crate::trigger::{should_trigger, RequestOrigin, ResponseHandlers};
use crate::ui::{UiLoop, UiQueue};
use codeintel_engine::{EngineClient, RequestContext};
use codeintel_util::TimingGuard;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

struct Inner {
    engine: Arc<dyn EngineClient>,
    editor: Arc<dyn EditorSurface>,
    config: RwLock<Arc<Config>>,
    registry: Arc<SessionRegistry>,
    history: Arc<HistoryService>,
    notifications: NotificationService,
    handlers: ResponseHandlers,
    ui: UiQueue,
    runtime: Handle,
    /// Engine round-trips still in flight.
    requests: Mutex<Vec<JoinHandle<()>>>,
    event_pump: Mutex<Option<JoinHandle<()>>>,
    ui_task: Mutex<Option<JoinHandle<()>>>,
}

/// Coordinates editor events, engine requests and UI updates.
///
/// Entry points are called on the editor's UI thread and never block: they
/// snapshot the view, hand the request to the runtime, and return. Answers
/// come back through the UI queue. Cloning shares the same state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Create a coordinator whose UI loop runs as a task on the current
    /// runtime.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(engine: Arc<dyn EngineClient>, editor: Arc<dyn EditorSurface>, config: Config) -> Self {
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::current());
        let (coordinator, ui_loop) = Self::with_scheduler(engine, Arc::clone(&editor), config, scheduler);
        let task = coordinator.inner.runtime.spawn(ui_loop.run(editor));
        *coordinator.inner.ui_task.lock() = Some(task);
        coordinator
    }

    /// Create a coordinator and hand back its [`UiLoop`] for the host to
    /// drive from its own UI thread.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn with_scheduler(
        engine: Arc<dyn EngineClient>,
        editor: Arc<dyn EditorSurface>,
        config: Config,
        scheduler: Arc<dyn Scheduler>,
    ) -> (Self, UiLoop) {
        let (ui, ui_loop) = UiQueue::new();
        let registry = Arc::new(SessionRegistry::new());
        let history = Arc::new(HistoryService::new(config.history_size()));
        let notifications = NotificationService::new(ui.clone(), Arc::clone(&scheduler));
        let handlers = ResponseHandlers {
            registry: Arc::clone(&registry),
            history: Arc::clone(&history),
            notifications: notifications.clone(),
            scheduler,
            ui: ui.clone(),
        };

        let coordinator = Self {
            inner: Arc::new(Inner {
                engine,
                editor,
                config: RwLock::new(Arc::new(config)),
                registry,
                history,
                notifications,
                handlers,
                ui,
                runtime: Handle::current(),
                requests: Mutex::new(Vec::new()),
                event_pump: Mutex::new(None),
                ui_task: Mutex::new(None),
            }),
        };
        (coordinator, ui_loop)
    }

    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.inner.config.read())
    }

    /// Replace the configuration; applies to the next request.
    pub fn set_config(&self, config: Config) {
        *self.inner.config.write() = Arc::new(config);
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.inner.registry
    }

    pub fn history(&self) -> &HistoryService {
        &self.inner.history
    }

    pub fn notifications(&self) -> &NotificationService {
        &self.inner.notifications
    }

    /// Show a status message.
    pub fn set_status(&self, request: StatusRequest) -> Option<u64> {
        self.inner.notifications.set_status(request)
    }

    /// Forward engine notifications to the status line until the engine's
    /// event stream closes. Calling it again is a no-op.
    pub fn start_event_pump(&self) {
        let mut pump = self.inner.event_pump.lock();
        if pump.is_some() {
            return;
        }
        let mut events = self.inner.engine.subscribe();
        let notifications = self.inner.notifications.clone();
        *pump = Some(self.inner.runtime.spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => notifications.on_engine_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Engine events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("Engine event stream closed");
        }));
    }

    /// The user edited `view`. Triggers completions or a call-tip when the
    /// edit was typing in a live-enabled language.
    pub fn on_modified(&self, view: ViewId) {
        let config = self.config();
        let Some((snapshot, language)) = self.resolve(view, &config) else {
            return;
        };
        if !config.is_live_for(&language) {
            trace!(language = %language, "Live triggers disabled");
            return;
        }

        let current = CurrentLine::at(&snapshot.text, snapshot.cursor).char_before_cursor();
        let recent = self
            .inner
            .editor
            .command_history()
            .map(|h| h.recent_commands(view, EditOrigin::LOOKBACK));
        let origin = EditOrigin::classify(recent.as_deref());
        if !should_trigger(current, origin) {
            trace!(view = %view, ?current, ?origin, "Edit does not trigger");
            return;
        }

        if current.is_some_and(|c| policy_for(&language).is_stop_char(c)) {
            self.inner.editor.hide_completions(view);
        }
        let buffer = self.session(&snapshot, &language, &config);
        self.submit(buffer, RequestContext::Trigger, &config);
    }

    /// `view` is about to be saved; rescan it if it has unsaved changes.
    pub fn on_pre_save(&self, view: ViewId) {
        let config = self.config();
        let Some((snapshot, language)) = self.resolve(view, &config) else {
            return;
        };
        if !snapshot.dirty {
            return;
        }
        let buffer = self.session(&snapshot, &language, &config);
        self.submit(buffer, RequestContext::Scan, &config);
    }

    /// Explicit completion request, regardless of the live setting.
    pub fn autocomplete(&self, view: ViewId) {
        self.explicit(view, RequestContext::Trigger);
    }

    /// Jump to the definition of the symbol at the cursor.
    pub fn goto_definition(&self, view: ViewId) {
        self.explicit(view, RequestContext::DefinitionTrigger);
    }

    /// The editor asks for completion items. Returns what the last answer
    /// stored and clears it.
    pub fn on_query_completions(&self, view: ViewId) -> Option<Vec<CompletionItem>> {
        if !self.inner.engine.is_available() {
            return None;
        }
        self.inner.registry.take_pending_completions(view)
    }

    /// `view` was closed.
    pub fn on_close(&self, view: ViewId) {
        self.inner.registry.remove(view);
    }

    /// Return to the location saved by the last definition jump in
    /// `window`. Returns `false` when there is none.
    pub fn back(&self, window: WindowId) -> bool {
        match self.inner.history.pop(window) {
            Some(location) => {
                debug!(window = %window, location = %location, "Jumping back");
                self.inner.editor.open_file(window, &location);
                true
            }
            None => false,
        }
    }

    /// Wait for every request issued so far to be answered and its UI
    /// updates applied.
    pub async fn settle(&self) {
        loop {
            let requests = std::mem::take(&mut *self.inner.requests.lock());
            if requests.is_empty() {
                break;
            }
            for request in requests {
                if let Err(e) = request.await {
                    if e.is_panic() {
                        warn!(error = %e, "Engine request task panicked");
                    } else {
                        debug!("Engine request task cancelled");
                    }
                }
            }
        }
        self.inner.ui.flush().await;
    }

    /// Drop all sessions, histories and status messages and stop
    /// listening to the engine.
    pub fn shutdown(&self) {
        info!("Coordinator shutting down");
        for request in self.inner.requests.lock().drain(..) {
            request.abort();
        }
        if let Some(pump) = self.inner.event_pump.lock().take() {
            pump.abort();
        }
        self.inner.registry.clear();
        self.inner.history.clear();
        self.inner.notifications.clear();
    }

    fn explicit(&self, view: ViewId, context: RequestContext) {
        let config = self.config();
        let Some((snapshot, language)) = self.resolve(view, &config) else {
            return;
        };
        let buffer = self.session(&snapshot, &language, &config);
        self.submit(buffer, context, &config);
    }

    /// Snapshot `view` and find its engine language, if it is handled.
    fn resolve(&self, view: ViewId, config: &Config) -> Option<(ViewSnapshot, String)> {
        if !self.inner.engine.is_available() {
            trace!("Engine unavailable");
            return None;
        }
        let snapshot = self.inner.editor.view_snapshot(view)?;
        let language = config.language_for_syntax(&snapshot.syntax);
        if !config.is_language_enabled(&language) || !self.inner.engine.languages().contains(&language) {
            trace!(view = %view, language = %language, "Language not handled");
            return None;
        }
        Some((snapshot, language))
    }

    fn session(&self, snapshot: &ViewSnapshot, language: &str, config: &Config) -> Buffer {
        let folders = self.inner.editor.project_folders(snapshot.window);
        let preferences = config.preferences_for(language, &folders);
        self.inner.registry.get_or_create(snapshot, language, preferences)
    }

    fn submit(&self, buffer: Buffer, context: RequestContext, config: &Config) {
        let origin = RequestOrigin::new(&buffer, context, config.tooltip_mode());
        let request = buffer.request(context);
        let engine = Arc::clone(&self.inner.engine);
        let handlers = self.inner.handlers.clone();

        debug!(view = %buffer.view, language = %buffer.language, context = context.as_str(), "Engine request");
        let mut timing = TimingGuard::engine(context.as_str(), buffer.view, buffer.language.as_str());
        let task = self.inner.runtime.spawn(async move {
            match engine.submit(request).await {
                Ok(response) => {
                    timing.answered();
                    handlers.handle(origin, response);
                }
                Err(e) => {
                    timing.failed();
                    warn!(context = context.as_str(), error = %e, "Engine request failed");
                }
            }
        });

        let mut requests = self.inner.requests.lock();
        requests.retain(|r| !r.is_finished());
        requests.push(task);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(pump) = self.event_pump.get_mut().take() {
            pump.abort();
        }
        if let Some(task) = self.ui_task.get_mut().take() {
            task.abort();
        }
    }
}
