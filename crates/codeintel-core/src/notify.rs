//! Status line notifications.
//!
//! Each status slot (`lid`) shows at most one message. A request bumps the
//! slot's sequence number and schedules two callbacks: one to display the
//! message after `delay`, one to erase it after `timeout`. Both are measured
//! from the request. The display callback only writes if no newer request
//! arrived for the slot in the meantime, so a slow message can never
//! overwrite a fresher one. The erase callback only clears the slot if the
//! message it was scheduled for is still the one shown.
//!
//! The slot table lock guards bookkeeping only. Editor updates are queued on
//! the [`UiQueue`] while the lock is held, which keeps them in decision order,
//! but never run under it, and the [`Scheduler`] is never called under it.

use crate::scheduler::Scheduler;
use crate::ui::UiQueue;
use codeintel_engine::{EngineEvent, EventTopic};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

/// Slot for general messages and engine errors.
pub const DEFAULT_LID: &str = "default";
/// Slot for engine progress.
pub const NOTIFICATION_LID: &str = "notification";
/// Slot for call-tips shown on the status bar.
pub const TIP_LID: &str = "tip";

/// Severity of a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    Error,
    Warning,
    Info,
    Event,
    Tip,
    /// Logged, never shown.
    Debug,
}

impl StatusKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatusKind::Error => "Error",
            StatusKind::Warning => "Warning",
            StatusKind::Info => "Info",
            StatusKind::Event => "Event",
            StatusKind::Tip => "Tip",
            StatusKind::Debug => "Debug",
        }
    }

    /// How long a message stays up when the caller gives no timeout.
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(match self {
            StatusKind::Error => 3000,
            StatusKind::Warning => 5000,
            StatusKind::Info | StatusKind::Event => 10000,
            _ => 3000,
        })
    }

    fn log(&self, lid: &str, message: &str) {
        match self {
            StatusKind::Error => error!(lid, "{}", message),
            StatusKind::Warning => warn!(lid, "{}", message),
            StatusKind::Info | StatusKind::Event => info!(lid, "{}", message),
            StatusKind::Tip | StatusKind::Debug => debug!(lid, "{}", message),
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A status message to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusRequest {
    pub kind: StatusKind,
    pub message: String,
    pub lid: String,
    /// Erase after this long; `None` uses the kind's default.
    pub timeout: Option<Duration>,
    /// Display after this long.
    pub delay: Duration,
}

impl StatusRequest {
    pub fn new(kind: StatusKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            lid: DEFAULT_LID.to_string(),
            timeout: None,
            delay: Duration::ZERO,
        }
    }

    pub fn lid(mut self, lid: impl Into<String>) -> Self {
        self.lid = lid.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Status for an engine event, if it has one.
    pub fn for_event(event: &EngineEvent) -> Option<Self> {
        match event.topic {
            EventTopic::Error => {
                let message = event.message.as_deref().unwrap_or("Unknown engine error");
                Some(Self::new(StatusKind::Error, message))
            }
            EventTopic::Progress => {
                let progress = render_progress(event.progress.unwrap_or(0), event.total);
                let message = match event.message.as_deref() {
                    Some(m) if !m.trim().is_empty() => format!("{} {}", m.trim(), progress),
                    _ => progress,
                };
                Some(Self::new(StatusKind::Event, message).lid(NOTIFICATION_LID))
            }
            EventTopic::BufferScanned => None,
        }
    }
}

/// `42%` for percentages, `3/7` for counts.
fn render_progress(progress: u64, total: Option<u64>) -> String {
    match total {
        Some(total) if total != 100 && total > 0 => format!("{progress}/{total}"),
        _ => format!("{progress}%"),
    }
}

#[derive(Debug, Default)]
struct Slot {
    /// Message currently on the status line.
    shown: Option<String>,
    /// Message whose display callback has not fired yet.
    pending: Option<String>,
    seq: u64,
}

struct Inner {
    slots: Mutex<HashMap<String, Slot>>,
    ui: UiQueue,
    scheduler: Arc<dyn Scheduler>,
}

/// Per-slot ordered, deduplicated, delayed status messages.
///
/// Cloning shares the same slots.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<Inner>,
}

impl NotificationService {
    pub fn new(ui: UiQueue, scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slots: Mutex::new(HashMap::new()),
                ui,
                scheduler,
            }),
        }
    }

    /// Request a status message.
    ///
    /// Returns the sequence number of the scheduled display, or `None` when
    /// nothing was scheduled because the message is already shown or about
    /// to be. An empty message erases whatever the slot shows now.
    pub fn set_status(&self, request: StatusRequest) -> Option<u64> {
        let StatusRequest {
            kind,
            message,
            lid,
            timeout,
            delay,
        } = request;
        let message = message.trim().to_string();

        if message.is_empty() {
            let shown = {
                let mut slots = self.inner.slots.lock();
                let slot = slots.entry(lid.clone()).or_default();
                slot.seq += 1;
                slot.pending = None;
                slot.shown.clone()
            };
            if let Some(shown) = shown {
                self.schedule_erase(lid, shown, delay);
            }
            return None;
        }

        let seq = {
            let mut slots = self.inner.slots.lock();
            let slot = slots.entry(lid.clone()).or_default();
            if slot.shown.as_deref() == Some(message.as_str())
                || slot.pending.as_deref() == Some(message.as_str())
            {
                trace!(lid = %lid, "Duplicate status ignored");
                return None;
            }
            slot.seq += 1;
            slot.pending = Some(message.clone());
            slot.seq
        };

        let timeout = timeout.unwrap_or_else(|| kind.default_timeout());
        let this = self.clone();
        let (display_lid, display_message) = (lid.clone(), message.clone());
        self.inner.scheduler.schedule(
            delay,
            Box::new(move || this.display(kind, display_lid, display_message, seq)),
        );
        self.schedule_erase(lid, message, timeout);
        Some(seq)
    }

    /// Surface an engine notification.
    ///
    /// Errors go to the default slot and the log (with the engine's stack
    /// trace), progress to the notification slot.
    pub fn on_engine_event(&self, event: &EngineEvent) {
        match event.topic {
            EventTopic::Error => {
                error!(
                    message = event.message.as_deref().unwrap_or_default(),
                    stack = event.stack.as_deref().unwrap_or_default(),
                    "Engine error"
                );
            }
            EventTopic::BufferScanned => {
                debug!(path = event.path.as_deref().unwrap_or_default(), "Buffer scanned");
            }
            EventTopic::Progress => {}
        }
        if let Some(request) = StatusRequest::for_event(event) {
            self.set_status(request);
        }
    }

    /// Message currently shown in `lid`.
    pub fn shown(&self, lid: &str) -> Option<String> {
        self.inner.slots.lock().get(lid).and_then(|s| s.shown.clone())
    }

    /// Erase every slot and invalidate all scheduled callbacks.
    pub fn clear(&self) {
        let mut slots = self.inner.slots.lock();
        for (lid, slot) in slots.iter_mut() {
            slot.seq += 1;
            slot.pending = None;
            if slot.shown.take().is_some() {
                let lid = lid.clone();
                self.inner.ui.dispatch(move |editor| editor.erase_status(&lid));
            }
        }
    }

    fn schedule_erase(&self, lid: String, message: String, after: Duration) {
        let this = self.clone();
        self.inner
            .scheduler
            .schedule(after, Box::new(move || this.erase(lid, message)));
    }

    fn display(&self, kind: StatusKind, lid: String, message: String, seq: u64) {
        {
            let mut slots = self.inner.slots.lock();
            let Some(slot) = slots.get_mut(&lid) else {
                return;
            };
            if slot.seq != seq {
                trace!(lid = %lid, seq, current = slot.seq, "Superseded status dropped");
                return;
            }
            slot.pending = None;
            if slot.shown.as_deref() == Some(message.as_str()) {
                return;
            }
            if kind != StatusKind::Debug {
                slot.shown = Some(message.clone());
                let text = format!("{}: {}", kind, message);
                let ui_lid = lid.clone();
                self.inner
                    .ui
                    .dispatch(move |editor| editor.set_status(&ui_lid, &text));
            }
        }
        kind.log(&lid, &message);
    }

    fn erase(&self, lid: String, message: String) {
        let mut slots = self.inner.slots.lock();
        let Some(slot) = slots.get_mut(&lid) else {
            return;
        };
        if slot.shown.as_deref() != Some(message.as_str()) {
            return;
        }
        slot.shown = None;
        self.inner
            .ui
            .dispatch(move |editor| editor.erase_status(&lid));
    }
}
