//! An in-memory editor.

use codeintel_core::{
    CommandHistory, EditorCommand, EditorSurface, ViewId, ViewSnapshot, WindowId,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A call made on the editor surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceCall {
    SetStatus { lid: String, text: String },
    EraseStatus { lid: String },
    ShowCompletions(ViewId),
    HideCompletions(ViewId),
    ShowTipPanel { window: WindowId, text: String },
    HideTipPanel(WindowId),
    InsertSnippet { view: ViewId, contents: String },
    OpenFile { window: WindowId, location: String },
}

struct ViewState {
    snapshot: ViewSnapshot,
    /// Oldest first.
    commands: Vec<EditorCommand>,
    /// Text and cursor before each undoable edit.
    undo: Vec<(String, usize)>,
}

#[derive(Default)]
struct State {
    views: HashMap<ViewId, ViewState>,
    active_view: Option<ViewId>,
    active_window: Option<WindowId>,
    folders: HashMap<WindowId, Vec<PathBuf>>,
    calls: Vec<SurfaceCall>,
}

/// An [`EditorSurface`] backed by plain strings that records every call.
///
/// Editing helpers update the view and its command history the way a real
/// editor would, so the coordinator's typing detection sees realistic
/// input.
#[derive(Clone)]
pub struct MockEditor {
    state: Arc<Mutex<State>>,
    history_enabled: Arc<AtomicBool>,
    next_view: Arc<AtomicU64>,
}

impl Default for MockEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEditor {
    /// An editor with one window (`WindowId(1)`) and no views.
    pub fn new() -> Self {
        let state = State {
            active_window: Some(WindowId(1)),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
            history_enabled: Arc::new(AtomicBool::new(true)),
            next_view: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Hide the command history capability.
    pub fn without_command_history(self) -> Self {
        self.history_enabled.store(false, Ordering::SeqCst);
        self
    }

    /// Open a saved file in the active window, focus it, and put the cursor
    /// at the end.
    pub fn open(&self, syntax: &str, path: &str, text: &str) -> ViewId {
        self.open_view(syntax, Some(PathBuf::from(path)), text)
    }

    /// Open an unsaved buffer.
    pub fn open_unsaved(&self, syntax: &str, text: &str) -> ViewId {
        self.open_view(syntax, None, text)
    }

    fn open_view(&self, syntax: &str, path: Option<PathBuf>, text: &str) -> ViewId {
        let view = ViewId(self.next_view.fetch_add(1, Ordering::SeqCst));
        let mut state = self.state.lock();
        let window = state.active_window.unwrap_or(WindowId(1));
        let cursor = text.chars().count();
        state.views.insert(
            view,
            ViewState {
                snapshot: ViewSnapshot {
                    view,
                    window,
                    path,
                    syntax: syntax.to_string(),
                    text: text.to_string(),
                    cursor,
                    selection_start: cursor,
                    dirty: false,
                },
                commands: Vec::new(),
                undo: Vec::new(),
            },
        );
        state.active_view = Some(view);
        view
    }

    pub fn focus(&self, view: ViewId) {
        self.state.lock().active_view = Some(view);
    }

    /// Drop a view, as the editor does when its tab closes.
    pub fn close(&self, view: ViewId) {
        let mut state = self.state.lock();
        state.views.remove(&view);
        if state.active_view == Some(view) {
            state.active_view = None;
        }
    }

    pub fn set_project_folders(&self, window: WindowId, folders: Vec<PathBuf>) {
        self.state.lock().folders.insert(window, folders);
    }

    pub fn set_syntax(&self, view: ViewId, syntax: &str) {
        self.with_view(view, |v| v.snapshot.syntax = syntax.to_string());
    }

    /// Type `characters` at the cursor.
    pub fn type_text(&self, view: ViewId, characters: &str) {
        self.edit(
            view,
            characters,
            EditorCommand::Typed {
                characters: characters.to_string(),
            },
        );
    }

    /// Insert `text` at the cursor as if by the given editor command.
    pub fn edit(&self, view: ViewId, text: &str, command: EditorCommand) {
        self.with_view(view, |v| {
            let snap = &mut v.snapshot;
            v.undo.push((snap.text.clone(), snap.cursor));
            let byte = byte_offset(&snap.text, snap.cursor);
            snap.text.insert_str(byte, text);
            snap.cursor += text.chars().count();
            snap.selection_start = snap.cursor;
            snap.dirty = true;
            v.commands.push(command);
        });
    }

    /// Undo the last edit.
    pub fn undo(&self, view: ViewId) {
        self.with_view(view, |v| {
            if let Some((text, cursor)) = v.undo.pop() {
                v.snapshot.text = text;
                v.snapshot.cursor = cursor;
                v.snapshot.selection_start = cursor;
            }
            v.commands.push(EditorCommand::Undo);
        });
    }

    pub fn move_cursor(&self, view: ViewId, cursor: usize) {
        self.with_view(view, |v| {
            v.snapshot.cursor = cursor;
            v.snapshot.selection_start = cursor;
        });
    }

    pub fn mark_saved(&self, view: ViewId) {
        self.with_view(view, |v| v.snapshot.dirty = false);
    }

    pub fn text(&self, view: ViewId) -> Option<String> {
        self.state.lock().views.get(&view).map(|v| v.snapshot.text.clone())
    }

    /// Every surface call so far, in order.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Status texts shown in `lid`, in order.
    pub fn statuses(&self, lid: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCall::SetStatus { lid: l, text } if l == lid => Some(text),
                _ => None,
            })
            .collect()
    }

    /// What `lid` shows now.
    pub fn current_status(&self, lid: &str) -> Option<String> {
        let mut current = None;
        for call in self.calls() {
            match call {
                SurfaceCall::SetStatus { lid: l, text } if l == lid => current = Some(text),
                SurfaceCall::EraseStatus { lid: l } if l == lid => current = None,
                _ => {}
            }
        }
        current
    }

    pub fn completion_shows(&self, view: ViewId) -> usize {
        self.count(|c| *c == SurfaceCall::ShowCompletions(view))
    }

    pub fn opened_files(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCall::OpenFile { location, .. } => Some(location),
                _ => None,
            })
            .collect()
    }

    pub fn inserted_snippets(&self, view: ViewId) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SurfaceCall::InsertSnippet { view: v, contents } if v == view => Some(contents),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: SurfaceCall) {
        self.state.lock().calls.push(call);
    }

    fn with_view(&self, view: ViewId, f: impl FnOnce(&mut ViewState)) {
        if let Some(v) = self.state.lock().views.get_mut(&view) {
            f(v);
        }
    }
}

fn byte_offset(text: &str, chars: usize) -> usize {
    text.char_indices()
        .nth(chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl CommandHistory for MockEditor {
    fn recent_commands(&self, view: ViewId, count: usize) -> Vec<EditorCommand> {
        self.state
            .lock()
            .views
            .get(&view)
            .map(|v| v.commands.iter().rev().take(count).cloned().collect())
            .unwrap_or_default()
    }
}

impl EditorSurface for MockEditor {
    fn active_window(&self) -> Option<WindowId> {
        self.state.lock().active_window
    }

    fn active_view(&self) -> Option<ViewId> {
        self.state.lock().active_view
    }

    fn view_snapshot(&self, view: ViewId) -> Option<ViewSnapshot> {
        self.state.lock().views.get(&view).map(|v| v.snapshot.clone())
    }

    fn project_folders(&self, window: WindowId) -> Vec<PathBuf> {
        self.state
            .lock()
            .folders
            .get(&window)
            .cloned()
            .unwrap_or_default()
    }

    fn set_status(&self, lid: &str, text: &str) {
        self.record(SurfaceCall::SetStatus {
            lid: lid.to_string(),
            text: text.to_string(),
        });
    }

    fn erase_status(&self, lid: &str) {
        self.record(SurfaceCall::EraseStatus {
            lid: lid.to_string(),
        });
    }

    fn show_completions(&self, view: ViewId) {
        self.record(SurfaceCall::ShowCompletions(view));
    }

    fn hide_completions(&self, view: ViewId) {
        self.record(SurfaceCall::HideCompletions(view));
    }

    fn show_tip_panel(&self, window: WindowId, text: &str) {
        self.record(SurfaceCall::ShowTipPanel {
            window,
            text: text.to_string(),
        });
    }

    fn hide_tip_panel(&self, window: WindowId) {
        self.record(SurfaceCall::HideTipPanel(window));
    }

    fn insert_snippet(&self, view: ViewId, contents: &str) {
        self.record(SurfaceCall::InsertSnippet {
            view,
            contents: contents.to_string(),
        });
    }

    fn open_file(&self, window: WindowId, location: &str) {
        self.record(SurfaceCall::OpenFile {
            window,
            location: location.to_string(),
        });
    }

    fn command_history(&self) -> Option<&dyn CommandHistory> {
        if self.history_enabled.load(Ordering::SeqCst) {
            Some(self)
        } else {
            None
        }
    }
}
