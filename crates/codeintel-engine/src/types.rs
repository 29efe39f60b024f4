//! Wire types exchanged with the engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// What the engine is asked to do with a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestContext {
    /// Re-scan the whole document.
    Scan,
    /// Offer completions or a call-tip at the cursor.
    Trigger,
    /// Resolve the definition of the symbol at the cursor.
    DefinitionTrigger,
}

impl RequestContext {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestContext::Scan => "scan",
            RequestContext::Trigger => "trigger",
            RequestContext::DefinitionTrigger => "definitionTrigger",
        }
    }
}

/// Configuration snapshot sent along with every request.
///
/// Built fresh for each request because project folders and settings can
/// change between edits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Global settings overlaid with the language's own settings.
    #[serde(default)]
    pub settings: Map<String, Value>,
    /// Extra directories to scan for symbols.
    #[serde(default)]
    pub extra_paths: Vec<PathBuf>,
    /// Directories excluded from scanning.
    #[serde(default)]
    pub exclude_paths: Vec<PathBuf>,
}

/// A request for the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRequest {
    pub language: String,
    pub path: String,
    pub text: String,
    /// Cursor offset in bytes of the UTF-8 encoded text.
    pub cursor_byte_pos: usize,
    pub preferences: Preferences,
    pub context: RequestContext,
}

/// One completion candidate as reported by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionEntry {
    pub kind: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CompletionEntry {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A definition candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    #[serde(default)]
    pub path: Option<String>,
    /// 1-based line.
    pub line: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// The engine's answer to a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EngineResponse {
    Completions {
        #[serde(default, rename = "triggerType", skip_serializing_if = "Option::is_none")]
        trigger_type: Option<String>,
        entries: Vec<CompletionEntry>,
    },
    CallTip {
        text: String,
    },
    Definitions {
        definitions: Vec<Definition>,
    },
    /// The document was (re)scanned.
    Scanned,
    /// Nothing to offer at this position.
    None,
}

/// Topic of an out-of-band engine notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventTopic {
    Progress,
    Error,
    BufferScanned,
}

/// Out-of-band engine notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineEvent {
    pub topic: EventTopic,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl EngineEvent {
    fn new(topic: EventTopic) -> Self {
        Self {
            topic,
            progress: None,
            total: None,
            message: None,
            stack: None,
            path: None,
        }
    }

    /// A progress tick.
    pub fn progress(progress: u64, total: Option<u64>) -> Self {
        Self {
            progress: Some(progress),
            total,
            ..Self::new(EventTopic::Progress)
        }
    }

    /// An error report.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(EventTopic::Error)
        }
    }

    /// A buffer finished scanning.
    pub fn buffer_scanned(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new(EventTopic::BufferScanned)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}
