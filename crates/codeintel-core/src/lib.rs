//! Editor-side coordination for an out-of-process code intelligence engine.
//!
//! The [`Coordinator`] sits between a host editor ([`EditorSurface`]) and an
//! engine ([`codeintel_engine::EngineClient`]):
//!
//! - editor events decide whether to ask the engine anything ([`trigger`]);
//! - each view keeps a [`Buffer`] session in the [`SessionRegistry`];
//! - engine answers are formatted ([`format`]) and applied on the UI thread
//!   through the [`UiQueue`], after checking they are not stale;
//! - status messages go through the [`NotificationService`];
//! - definition jumps are recorded per window in the [`HistoryService`].

pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod editor;
pub mod error;
pub mod format;
pub mod history;
pub mod notify;
pub mod registry;
pub mod scheduler;
pub mod trigger;
pub mod ui;

pub use buffer::{Buffer, CurrentLine, UNSAVED_PATH};
pub use config::{Config, LanguageSettings, TooltipMode};
pub use coordinator::Coordinator;
pub use editor::{
    CommandHistory, EditOrigin, EditorCommand, EditorSurface, ViewId, ViewSnapshot, WindowId,
};
pub use error::{ConfigError, CoreError, CoreResult};
pub use format::CompletionItem;
pub use history::HistoryService;
pub use notify::{NotificationService, StatusKind, StatusRequest};
pub use registry::SessionRegistry;
pub use scheduler::{Scheduler, TokioScheduler};
pub use ui::{UiJob, UiLoop, UiQueue};
