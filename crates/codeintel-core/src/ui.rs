//! Marshalling work onto the editor's UI thread.
//!
//! Background tasks never call [`EditorSurface`] directly. They push jobs
//! onto a [`UiQueue`]; the host drives the matching [`UiLoop`], which runs
//! jobs one at a time in the order they were queued.

use crate::editor::EditorSurface;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::trace;

/// A unit of UI work.
pub type UiJob = Box<dyn FnOnce(&dyn EditorSurface) + Send>;

/// Sending side of the UI job queue. Cheap to clone.
#[derive(Clone)]
pub struct UiQueue {
    tx: mpsc::UnboundedSender<UiJob>,
}

/// Receiving side, owned by whatever plays the UI thread.
pub struct UiLoop {
    rx: mpsc::UnboundedReceiver<UiJob>,
}

impl UiQueue {
    pub fn new() -> (Self, UiLoop) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, UiLoop { rx })
    }

    /// Queue `job`. Never blocks; returns `false` once the loop is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce(&dyn EditorSurface) + Send + 'static,
    {
        self.tx.send(Box::new(job)).is_ok()
    }

    /// Wait until every job queued before this call has run.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.dispatch(move |_| {
            let _ = done_tx.send(());
        }) {
            let _ = done_rx.await;
        }
    }
}

impl UiLoop {
    /// Run jobs until every [`UiQueue`] is dropped.
    pub async fn run(mut self, editor: Arc<dyn EditorSurface>) {
        while let Some(job) = self.rx.recv().await {
            job(editor.as_ref());
        }
        trace!("UI loop finished");
    }

    /// Run the loop as a task, for hosts without their own UI thread.
    pub fn spawn(self, editor: Arc<dyn EditorSurface>) -> JoinHandle<()> {
        tokio::spawn(self.run(editor))
    }

    /// Run whatever is queued right now without waiting for more.
    ///
    /// For hosts that pump the queue from their own event loop.
    pub fn drain(&mut self, editor: &dyn EditorSurface) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            job(editor);
            ran += 1;
        }
        ran
    }
}
