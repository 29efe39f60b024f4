//! A single-view editor surface that prints to the terminal.

use codeintel_core::{EditorSurface, ViewId, ViewSnapshot, WindowId};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

pub const VIEW: ViewId = ViewId(1);
pub const WINDOW: WindowId = WindowId(1);

/// Editor surface for headless queries.
///
/// Holds one read-only view of the queried file. Status lines, call-tip
/// panels, snippets and navigation targets are printed as they arrive and
/// kept for the caller.
pub struct ConsoleEditor {
    snapshot: ViewSnapshot,
    folders: Vec<PathBuf>,
    echo: bool,
    output: Mutex<Vec<String>>,
    opened: Mutex<Vec<String>>,
    completions_shown: AtomicBool,
}

impl ConsoleEditor {
    pub fn new(path: &Path, syntax: impl Into<String>, text: String, cursor: usize, project: &Path) -> Self {
        Self {
            snapshot: ViewSnapshot {
                view: VIEW,
                window: WINDOW,
                path: Some(path.to_path_buf()),
                syntax: syntax.into(),
                text,
                cursor,
                selection_start: cursor,
                dirty: false,
            },
            folders: vec![project.to_path_buf()],
            echo: true,
            output: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            completions_shown: AtomicBool::new(false),
        }
    }

    /// Keep output without printing it.
    #[cfg(test)]
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    #[cfg(test)]
    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }

    /// Locations passed to `open_file`.
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }

    pub fn completions_shown(&self) -> bool {
        self.completions_shown.load(Ordering::SeqCst)
    }

    fn emit(&self, line: String) {
        if self.echo {
            println!("{line}");
        }
        self.output.lock().push(line);
    }
}

impl EditorSurface for ConsoleEditor {
    fn active_window(&self) -> Option<WindowId> {
        Some(WINDOW)
    }

    fn active_view(&self) -> Option<ViewId> {
        Some(VIEW)
    }

    fn view_snapshot(&self, view: ViewId) -> Option<ViewSnapshot> {
        (view == VIEW).then(|| self.snapshot.clone())
    }

    fn project_folders(&self, _window: WindowId) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn set_status(&self, lid: &str, text: &str) {
        self.emit(format!("[{lid}] {text}"));
    }

    fn erase_status(&self, _lid: &str) {}

    fn show_completions(&self, _view: ViewId) {
        self.completions_shown.store(true, Ordering::SeqCst);
    }

    fn hide_completions(&self, _view: ViewId) {}

    fn show_tip_panel(&self, _window: WindowId, text: &str) {
        self.emit(text.to_string());
    }

    fn hide_tip_panel(&self, _window: WindowId) {}

    fn insert_snippet(&self, _view: ViewId, contents: &str) {
        self.emit(format!("snippet: {contents}"));
    }

    fn open_file(&self, _window: WindowId, location: &str) {
        self.emit(format!("definition: {location}"));
        self.opened.lock().push(location.to_string());
    }
}

/// Character offset of a 1-based line and column.
///
/// The column may point one past the end of the line.
pub fn cursor_offset(text: &str, line: usize, col: usize) -> Option<usize> {
    if line == 0 || col == 0 {
        return None;
    }
    let mut offset = 0;
    for (index, content) in text.split('\n').enumerate() {
        let width = content.chars().count();
        if index + 1 == line {
            return (col <= width + 1).then_some(offset + col - 1);
        }
        offset += width + 1;
    }
    None
}

/// Editor syntax name for a file, from its extension.
pub fn syntax_for_path(path: &Path) -> String {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    let syntax = match extension.as_str() {
        "py" | "pyw" => "Python",
        "php" | "inc" => "PHP",
        "js" | "mjs" | "cjs" => "JavaScript",
        "rb" => "Ruby",
        "pl" | "pm" => "Perl",
        "tcl" => "Tcl",
        "go" => "Go",
        "html" | "htm" => "HTML",
        "css" => "CSS",
        "xml" => "XML",
        _ => "Plain Text",
    };
    syntax.to_string()
}
