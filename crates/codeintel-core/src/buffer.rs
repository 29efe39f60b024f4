//! Per-view session state sent to the engine.

use crate::editor::{ViewId, ViewSnapshot, WindowId};
use crate::format::CompletionItem;
use codeintel_engine::{EngineRequest, Preferences, RequestContext};

/// Path reported for buffers that have never been saved.
pub const UNSAVED_PATH: &str = "<Unsaved>";

/// The line under the cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentLine {
    /// From the start of the line through one character past the cursor.
    pub text: String,
    /// Byte offset of the cursor within `text`.
    pub cursor: usize,
}

impl CurrentLine {
    /// Extract the line around character offset `cursor` of `text`.
    pub fn at(text: &str, cursor: usize) -> Self {
        let cursor_byte = char_to_byte(text, cursor);
        let start = text[..cursor_byte].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let end = text[cursor_byte..]
            .chars()
            .next()
            .map(|c| cursor_byte + c.len_utf8())
            .unwrap_or(cursor_byte);
        Self {
            text: text[start..end].to_string(),
            cursor: cursor_byte - start,
        }
    }

    pub fn before_cursor(&self) -> &str {
        &self.text[..self.cursor]
    }

    /// Character immediately left of the cursor.
    pub fn char_before_cursor(&self) -> Option<char> {
        self.before_cursor().chars().next_back()
    }
}

/// Byte offset of character offset `pos`, clamped to the end of `text`.
pub fn char_to_byte(text: &str, pos: usize) -> usize {
    text.char_indices()
        .nth(pos)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Zero-based (row, column) of character offset `pos`; the column counts
/// characters.
pub fn row_col(text: &str, pos: usize) -> (usize, usize) {
    let byte = char_to_byte(text, pos);
    let before = &text[..byte];
    let row = before.matches('\n').count();
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    (row, before[line_start..].chars().count())
}

/// One editor view's session with the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub view: ViewId,
    pub window: WindowId,
    pub language: String,
    /// File path, or [`UNSAVED_PATH`].
    pub path: String,
    pub text: String,
    /// Character offset of the cursor.
    pub cursor: usize,
    pub cursor_byte_pos: usize,
    pub selection_start: usize,
    pub line: CurrentLine,
    pub preferences: Preferences,
    pending_completions: Option<Vec<CompletionItem>>,
}

impl Buffer {
    pub fn new(snapshot: &ViewSnapshot, language: impl Into<String>) -> Self {
        let mut buffer = Self {
            view: snapshot.view,
            window: snapshot.window,
            language: language.into(),
            path: String::new(),
            text: String::new(),
            cursor: 0,
            cursor_byte_pos: 0,
            selection_start: 0,
            line: CurrentLine::default(),
            preferences: Preferences::default(),
            pending_completions: None,
        };
        buffer.refresh(snapshot);
        buffer
    }

    /// Copy path, text and cursor from a fresh snapshot.
    pub fn refresh(&mut self, snapshot: &ViewSnapshot) {
        self.window = snapshot.window;
        self.path = snapshot
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| UNSAVED_PATH.to_string());
        self.text = snapshot.text.clone();
        self.cursor = snapshot.cursor;
        self.cursor_byte_pos = char_to_byte(&self.text, self.cursor);
        self.selection_start = snapshot.selection_start;
        self.line = CurrentLine::at(&self.text, self.cursor);
    }

    /// Build an engine request for this buffer's current state.
    pub fn request(&self, context: RequestContext) -> EngineRequest {
        EngineRequest {
            language: self.language.clone(),
            path: self.path.clone(),
            text: self.text.clone(),
            cursor_byte_pos: self.cursor_byte_pos,
            preferences: self.preferences.clone(),
            context,
        }
    }

    /// Store completions for the next popup query, replacing older ones.
    pub fn set_pending_completions(&mut self, items: Vec<CompletionItem>) {
        self.pending_completions = Some(items);
    }

    /// Take the stored completions; a second call returns `None`.
    pub fn take_pending_completions(&mut self) -> Option<Vec<CompletionItem>> {
        self.pending_completions.take()
    }

    pub fn has_pending_completions(&self) -> bool {
        self.pending_completions.is_some()
    }
}
