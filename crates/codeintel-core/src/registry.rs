//! Buffers for every open view.

use crate::buffer::Buffer;
use crate::editor::{ViewId, ViewSnapshot};
use crate::format::CompletionItem;
use codeintel_engine::Preferences;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Map from view to its [`Buffer`].
#[derive(Default)]
pub struct SessionRegistry {
    buffers: Mutex<HashMap<ViewId, Buffer>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh the view's buffer from `snapshot`, creating it on first use,
    /// and return a copy for building a request.
    ///
    /// A buffer whose language changed (the user switched syntax) is
    /// replaced so stale completions do not leak across languages.
    pub fn get_or_create(
        &self,
        snapshot: &ViewSnapshot,
        language: &str,
        preferences: Preferences,
    ) -> Buffer {
        let mut buffers = self.buffers.lock();
        let buffer = buffers
            .entry(snapshot.view)
            .and_modify(|b| {
                if b.language == language {
                    b.refresh(snapshot);
                } else {
                    debug!(view = %snapshot.view, from = %b.language, to = language, "Buffer language changed");
                    *b = Buffer::new(snapshot, language);
                }
            })
            .or_insert_with(|| {
                debug!(view = %snapshot.view, language, "Buffer created");
                Buffer::new(snapshot, language)
            });
        buffer.preferences = preferences;
        buffer.clone()
    }

    /// Drop the view's buffer. Removing an unknown view is a no-op.
    pub fn remove(&self, view: ViewId) -> bool {
        let removed = self.buffers.lock().remove(&view).is_some();
        if removed {
            debug!(view = %view, "Buffer removed");
        }
        removed
    }

    pub fn contains(&self, view: ViewId) -> bool {
        self.buffers.lock().contains_key(&view)
    }

    pub fn language_of(&self, view: ViewId) -> Option<String> {
        self.buffers.lock().get(&view).map(|b| b.language.clone())
    }

    /// Store completions for the view's next popup query.
    pub fn set_pending_completions(&self, view: ViewId, items: Vec<CompletionItem>) -> bool {
        match self.buffers.lock().get_mut(&view) {
            Some(buffer) => {
                buffer.set_pending_completions(items);
                true
            }
            None => false,
        }
    }

    pub fn take_pending_completions(&self, view: ViewId) -> Option<Vec<CompletionItem>> {
        self.buffers
            .lock()
            .get_mut(&view)
            .and_then(|b| b.take_pending_completions())
    }

    pub fn len(&self) -> usize {
        self.buffers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.lock().is_empty()
    }

    pub fn clear(&self) {
        self.buffers.lock().clear();
    }
}
