//! Client side of the out-of-process code intelligence engine.
//!
//! The engine parses, scans and resolves symbols for many languages. This
//! crate does none of that; it only describes how to talk to it:
//!
//! - [`EngineClient`]: the asynchronous request/response + event-stream
//!   surface the coordinator consumes
//! - wire types for requests, responses and out-of-band events
//! - [`ProcessEngine`]: an engine running as a child process, spoken to
//!   with `Content-Length` framed JSON over stdio
//!
//! ```text
//! ┌─────────────┐  submit   ┌───────────────┐  stdio   ┌──────────┐
//! │ coordinator │──────────▶│ ProcessEngine │─────────▶│  engine  │
//! │             │◀──────────│               │◀─────────│ process  │
//! └─────────────┘  events   └───────────────┘          └──────────┘
//! ```

mod client;
mod error;
mod process;
pub mod transport;
mod types;

pub use client::EngineClient;
pub use error::{EngineError, EngineResult};
pub use process::{EngineCommand, ProcessEngine};
pub use types::{
    CompletionEntry, Definition, EngineEvent, EngineRequest, EngineResponse, EventTopic,
    Preferences, RequestContext,
};
