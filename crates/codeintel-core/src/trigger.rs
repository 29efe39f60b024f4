//! When to ask the engine, and what to do with its answers.
//!
//! Responses arrive on runtime tasks. Each handler formats what it can off
//! the UI thread, then queues a UI job that first re-checks the view is still
//! the one the request was made for before touching the editor.

use crate::buffer::{row_col, Buffer, CurrentLine};
use crate::config::TooltipMode;
use crate::editor::{EditOrigin, EditorSurface, ViewId, WindowId};
use crate::format::{format_call_tip, format_completions, CallTip, CompletionItem};
use crate::history::HistoryService;
use crate::notify::{NotificationService, StatusKind, StatusRequest, TIP_LID};
use crate::registry::SessionRegistry;
use crate::scheduler::Scheduler;
use crate::ui::UiQueue;
use codeintel_engine::{CompletionEntry, Definition, EngineResponse, RequestContext};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// How long call-tips stay on the status bar or in the panel.
pub const TIP_TIMEOUT: Duration = Duration::from_secs(15);
/// Delay before the parameter snippet of a call-tip is inserted.
pub const SNIPPET_DELAY: Duration = Duration::from_millis(500);

/// Whether an edit leaving `current` left of the cursor should trigger.
///
/// Only a visible character typed by the user does.
pub fn should_trigger(current: Option<char>, origin: EditOrigin) -> bool {
    match current {
        None | Some('\n') | Some('\t') => false,
        Some(_) => origin == EditOrigin::User,
    }
}

/// What a response has to be matched against when it arrives.
#[derive(Debug, Clone)]
pub struct RequestOrigin {
    pub view: ViewId,
    pub window: WindowId,
    pub language: String,
    pub context: RequestContext,
    pub line: CurrentLine,
    /// Character offset of the cursor when the request was made.
    pub cursor: usize,
    pub tooltips: TooltipMode,
}

impl RequestOrigin {
    pub fn new(buffer: &Buffer, context: RequestContext, tooltips: TooltipMode) -> Self {
        Self {
            view: buffer.view,
            window: buffer.window,
            language: buffer.language.clone(),
            context,
            line: buffer.line.clone(),
            cursor: buffer.cursor,
            tooltips,
        }
    }

    /// The view is still focused and its session still has this language.
    pub fn is_current(&self, editor: &dyn EditorSurface, registry: &SessionRegistry) -> bool {
        editor.active_view() == Some(self.view)
            && registry.language_of(self.view).as_deref() == Some(self.language.as_str())
    }
}

/// Routes engine responses to the completion, call-tip and definition
/// handlers.
#[derive(Clone)]
pub struct ResponseHandlers {
    pub(crate) registry: Arc<SessionRegistry>,
    pub(crate) history: Arc<HistoryService>,
    pub(crate) notifications: NotificationService,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) ui: UiQueue,
}

impl ResponseHandlers {
    pub fn handle(&self, origin: RequestOrigin, response: EngineResponse) {
        match (origin.context, response) {
            (RequestContext::Trigger, EngineResponse::Completions { trigger_type, entries }) => {
                self.completions(origin, trigger_type, entries)
            }
            (RequestContext::Trigger, EngineResponse::CallTip { text }) => {
                self.call_tip(origin, text)
            }
            (RequestContext::DefinitionTrigger, EngineResponse::Definitions { definitions }) => {
                self.definitions(origin, definitions)
            }
            (RequestContext::Scan, _) => {
                debug!(view = %origin.view, language = %origin.language, "Scan finished");
            }
            (context, EngineResponse::None) => {
                debug!(view = %origin.view, context = context.as_str(), "Nothing to offer");
            }
            (context, response) => {
                debug!(context = context.as_str(), ?response, "Response does not match request");
            }
        }
    }

    fn completions(&self, origin: RequestOrigin, trigger_type: Option<String>, entries: Vec<CompletionEntry>) {
        if entries.is_empty() {
            debug!(view = %origin.view, "No completions");
            return;
        }
        let items = format_completions(
            &entries,
            &origin.language,
            origin.line.before_cursor(),
            trigger_type.as_deref(),
        );
        self.show_items(origin, items, "completions");
    }

    fn call_tip(&self, origin: RequestOrigin, text: String) {
        let tip = format_call_tip(&text, origin.line.before_cursor());
        match origin.tooltips {
            TooltipMode::Popup => {
                let snippet = tip.snippet.as_deref().unwrap_or("${0}");
                let items = tip
                    .lines
                    .iter()
                    .map(|line| CompletionItem::new(line.clone(), snippet))
                    .collect();
                self.show_items(origin, items, "call-tip");
            }
            TooltipMode::Status | TooltipMode::Panel => self.show_tip(origin, tip),
        }
    }

    /// Store `items` as the view's pending completions and reopen the list.
    fn show_items(&self, origin: RequestOrigin, items: Vec<CompletionItem>, what: &'static str) {
        let registry = Arc::clone(&self.registry);
        self.ui.dispatch(move |editor| {
            if !origin.is_current(editor, &registry) {
                debug!(view = %origin.view, what, "Stale response dropped");
                return;
            }
            registry.set_pending_completions(origin.view, items);
            editor.show_completions(origin.view);
        });
    }

    fn show_tip(&self, origin: RequestOrigin, tip: CallTip) {
        let this = self.clone();
        self.ui.dispatch(move |editor| {
            if !origin.is_current(editor, &this.registry) {
                debug!(view = %origin.view, "Stale call-tip dropped");
                return;
            }
            if origin.tooltips == TooltipMode::Panel {
                editor.show_tip_panel(origin.window, &tip.lines.join("\n"));
                let ui = this.ui.clone();
                let window = origin.window;
                this.scheduler.schedule(
                    TIP_TIMEOUT,
                    Box::new(move || {
                        ui.dispatch(move |editor| editor.hide_tip_panel(window));
                    }),
                );
            } else {
                this.notifications.set_status(
                    StatusRequest::new(StatusKind::Tip, tip.text)
                        .lid(TIP_LID)
                        .timeout(TIP_TIMEOUT),
                );
            }
            if let Some(snippet) = tip.snippet {
                this.schedule_snippet(origin, snippet);
            }
        });
    }

    /// Insert the call-tip snippet shortly, unless the cursor moved.
    fn schedule_snippet(&self, origin: RequestOrigin, snippet: String) {
        let ui = self.ui.clone();
        self.scheduler.schedule(
            SNIPPET_DELAY,
            Box::new(move || {
                ui.dispatch(move |editor| {
                    let unmoved = editor
                        .view_snapshot(origin.view)
                        .is_some_and(|s| s.cursor == origin.cursor);
                    if unmoved {
                        editor.insert_snippet(origin.view, &snippet);
                    } else {
                        debug!(view = %origin.view, "Cursor moved, snippet skipped");
                    }
                });
            }),
        );
    }

    fn definitions(&self, origin: RequestOrigin, definitions: Vec<Definition>) {
        let Some(definition) = definitions.into_iter().next() else {
            debug!(view = %origin.view, "No definition found");
            return;
        };
        let Some(path) = definition.path.filter(|p| !p.is_empty()) else {
            debug!(name = ?definition.name, "Cannot jump to definition without a path");
            return;
        };
        let target = format!("{}:{}:1", path, definition.line);

        let registry = Arc::clone(&self.registry);
        let history = Arc::clone(&self.history);
        self.ui.dispatch(move |editor| {
            if !origin.is_current(editor, &registry) {
                debug!(view = %origin.view, "Stale definition dropped");
                return;
            }
            let window = editor.active_window().unwrap_or(origin.window);
            if let Some(snapshot) = editor.view_snapshot(origin.view) {
                if let Some(current) = &snapshot.path {
                    let (row, col) = row_col(&snapshot.text, snapshot.selection_start);
                    history.push(window, format!("{}:{}:{}", current.display(), row + 1, col + 1));
                }
            }
            debug!(target = %target, "Jumping to definition");
            editor.open_file(window, &target);
        });
    }
}
