//! Testing utilities, fixtures, and mocks for codeintel.
//!
//! - **Engine**: [`MockEngine`], a scripted [`codeintel_engine::EngineClient`]
//! - **Editor**: [`MockEditor`], an in-memory [`codeintel_core::EditorSurface`]
//!   that records every call made on it
//! - **Fixtures**: temporary project directories with config files
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use codeintel_test_utils::{MockEditor, MockEngine};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_completion_round_trip() {
//!     let engine = MockEngine::new().with_completions(vec![("function", "foo")]);
//!     let editor = MockEditor::new();
//!     let view = editor.open("Python", "/src/app.py", "");
//!     let coordinator = Coordinator::new(engine.clone(), editor.clone(), Config::default());
//!
//!     editor.type_text(view, "f");
//!     coordinator.on_modified(view);
//!     coordinator.settle().await;
//!
//!     assert_eq!(engine.request_count(), 1);
//! }
//! ```

pub mod editor;
pub mod engine;
pub mod fixtures;

pub use editor::{MockEditor, SurfaceCall};
pub use engine::MockEngine;
pub use fixtures::TestProject;
