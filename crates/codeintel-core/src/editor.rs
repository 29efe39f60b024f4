//! The editor as seen by the coordinator.
//!
//! Everything the coordinator needs from the host editor goes through
//! [`EditorSurface`]. Calls on it must happen on the editor's UI thread,
//! which is why background work never touches it directly and instead
//! dispatches jobs through [`crate::ui::UiQueue`].

use std::fmt;
use std::path::PathBuf;

/// Identifier of an editor view (one open document pane).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// Identifier of an editor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(pub u64);

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "view#{}", self.0)
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Point-in-time copy of a view's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSnapshot {
    pub view: ViewId,
    pub window: WindowId,
    /// File on disk, `None` for unsaved buffers.
    pub path: Option<PathBuf>,
    /// Syntax name or syntax definition path.
    pub syntax: String,
    pub text: String,
    /// Character offset of the cursor (end of the primary selection).
    pub cursor: usize,
    /// Character offset where the primary selection starts.
    pub selection_start: usize,
    /// Unsaved modifications present.
    pub dirty: bool,
}

/// A command recorded in the editor's per-view command history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    /// Characters typed by the user.
    Typed { characters: String },
    /// A completion was inserted from the popup.
    InsertCompletion,
    /// A completion was committed with a commit character.
    CommitCompletion,
    Paste,
    InsertSnippet { contents: String },
    Undo,
    Redo,
    /// Anything else, by name.
    Other { name: String },
}

/// Access to recent editor commands, newest first.
pub trait CommandHistory: Send + Sync {
    fn recent_commands(&self, view: ViewId, count: usize) -> Vec<EditorCommand>;
}

/// Whether a modification came from the user typing or from the editor
/// itself (completion insertion, paste, undo and the like).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOrigin {
    User,
    Program,
}

impl EditOrigin {
    /// Number of history entries consulted. Only the newest one decides.
    pub const LOOKBACK: usize = 1;

    /// Classify the latest edit from the newest-first command history.
    ///
    /// Without a history capability, or with an empty history, the edit is
    /// assumed to be typing. Otherwise only a `Typed` command whose last
    /// character is not a newline or tab counts as the user.
    pub fn classify(history: Option<&[EditorCommand]>) -> Self {
        let Some(newest) = history.and_then(|h| h.first()) else {
            return EditOrigin::User;
        };
        match newest {
            EditorCommand::Typed { characters } => match characters.chars().last() {
                Some('\n') | Some('\t') => EditOrigin::Program,
                _ => EditOrigin::User,
            },
            _ => EditOrigin::Program,
        }
    }
}

/// The host editor.
///
/// Every method is called on the UI thread only.
pub trait EditorSurface: Send + Sync + 'static {
    fn active_window(&self) -> Option<WindowId>;

    fn active_view(&self) -> Option<ViewId>;

    /// Current state of `view`, `None` if it has been closed.
    fn view_snapshot(&self, view: ViewId) -> Option<ViewSnapshot>;

    /// Root folders of the project open in `window`.
    fn project_folders(&self, window: WindowId) -> Vec<PathBuf>;

    /// Show `text` in the status slot `lid`.
    fn set_status(&self, lid: &str, text: &str);

    fn erase_status(&self, lid: &str);

    /// Open the completion popup; the editor pulls items with
    /// `Coordinator::on_query_completions`.
    fn show_completions(&self, view: ViewId);

    fn hide_completions(&self, view: ViewId);

    fn show_tip_panel(&self, window: WindowId, text: &str);

    fn hide_tip_panel(&self, window: WindowId);

    /// Insert a snippet with `${n:name}` placeholders at the cursor.
    fn insert_snippet(&self, view: ViewId, contents: &str);

    /// Open a `path:row:col` location (1-based row and column).
    fn open_file(&self, window: WindowId, location: &str);

    /// Command history, if the editor exposes one.
    fn command_history(&self) -> Option<&dyn CommandHistory> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(s: &str) -> EditorCommand {
        EditorCommand::Typed {
            characters: s.to_string(),
        }
    }

    #[test]
    fn test_classify_without_history_is_user() {
        assert_eq!(EditOrigin::classify(None), EditOrigin::User);
        assert_eq!(EditOrigin::classify(Some(&[])), EditOrigin::User);
    }

    #[test]
    fn test_classify_typing() {
        assert_eq!(EditOrigin::classify(Some(&[typed("a")])), EditOrigin::User);
        assert_eq!(
            EditOrigin::classify(Some(&[typed("."), EditorCommand::Paste])),
            EditOrigin::User
        );
        assert_eq!(
            EditOrigin::classify(Some(&[typed("\n")])),
            EditOrigin::Program
        );
        assert_eq!(
            EditOrigin::classify(Some(&[typed("x\t")])),
            EditOrigin::Program
        );
    }

    #[test]
    fn test_classify_reads_only_newest() {
        assert_eq!(EditOrigin::LOOKBACK, 1);
        assert_eq!(
            EditOrigin::classify(Some(&[typed("("), EditorCommand::CommitCompletion])),
            EditOrigin::User
        );
        assert_eq!(
            EditOrigin::classify(Some(&[EditorCommand::CommitCompletion, typed("f")])),
            EditOrigin::Program
        );
    }

    #[test]
    fn test_classify_program_commands() {
        for command in [
            EditorCommand::InsertCompletion,
            EditorCommand::CommitCompletion,
            EditorCommand::Paste,
            EditorCommand::Undo,
            EditorCommand::Redo,
            EditorCommand::InsertSnippet {
                contents: "${1:x}".to_string(),
            },
            EditorCommand::Other {
                name: "reindent".to_string(),
            },
        ] {
            assert_eq!(
                EditOrigin::classify(Some(&[command.clone(), typed("a")])),
                EditOrigin::Program,
                "{command:?}"
            );
        }
    }

    #[test]
    fn test_ids_display() {
        assert_eq!(ViewId(3).to_string(), "view#3");
        assert_eq!(WindowId(1).to_string(), "window#1");
    }
}
