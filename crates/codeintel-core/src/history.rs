//! Per-window jump history for go-to-definition and back.

use crate::editor::WindowId;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

/// Bounded stack of `path:row:col` locations per window.
///
/// When full, the oldest entry is dropped.
pub struct HistoryService {
    capacity: usize,
    windows: Mutex<HashMap<WindowId, VecDeque<String>>>,
}

impl HistoryService {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&self, window: WindowId, location: impl Into<String>) {
        let mut windows = self.windows.lock();
        let stack = windows.entry(window).or_default();
        if stack.len() == self.capacity {
            stack.pop_front();
        }
        stack.push_back(location.into());
    }

    /// Most recent location, removing it.
    pub fn pop(&self, window: WindowId) -> Option<String> {
        let mut windows = self.windows.lock();
        let stack = windows.get_mut(&window)?;
        let location = stack.pop_back();
        if stack.is_empty() {
            windows.remove(&window);
        }
        location
    }

    pub fn len(&self, window: WindowId) -> usize {
        self.windows.lock().get(&window).map_or(0, VecDeque::len)
    }

    pub fn clear(&self) {
        self.windows.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_is_lifo() {
        let history = HistoryService::new(64);
        let w = WindowId(1);
        history.push(w, "/a.py:1:1");
        history.push(w, "/b.py:2:3");
        assert_eq!(history.pop(w).as_deref(), Some("/b.py:2:3"));
        assert_eq!(history.pop(w).as_deref(), Some("/a.py:1:1"));
        assert_eq!(history.pop(w), None);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let history = HistoryService::new(3);
        let w = WindowId(1);
        for i in 0..5 {
            history.push(w, format!("/f.py:{i}:1"));
        }
        assert_eq!(history.len(w), 3);
        assert_eq!(history.pop(w).as_deref(), Some("/f.py:4:1"));
        assert_eq!(history.pop(w).as_deref(), Some("/f.py:3:1"));
        assert_eq!(history.pop(w).as_deref(), Some("/f.py:2:1"));
        assert_eq!(history.pop(w), None);
    }

    #[test]
    fn test_windows_are_independent() {
        let history = HistoryService::new(4);
        history.push(WindowId(1), "/a.py:1:1");
        assert_eq!(history.pop(WindowId(2)), None);
        assert_eq!(history.len(WindowId(1)), 1);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let history = HistoryService::new(0);
        history.push(WindowId(1), "a");
        history.push(WindowId(1), "b");
        assert_eq!(history.capacity(), 1);
        assert_eq!(history.pop(WindowId(1)).as_deref(), Some("b"));
    }
}
