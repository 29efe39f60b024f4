//! Message framing for the engine's stdio protocol.
//!
//! Each message is a JSON document preceded by a `Content-Length` header
//! and a blank line. Requests carry a numeric `id` and a `method`;
//! responses echo the `id`; notifications carry a `topic` and no `id`.

use crate::error::{EngineError, EngineResult};
use crate::types::EngineEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Request envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl WireRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            id,
            method: method.into(),
            params,
        }
    }
}

/// Error payload of a failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireResponse {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<WireError>,
}

/// Anything that can arrive from the engine.
#[derive(Debug, Clone)]
pub enum Incoming {
    Response(WireResponse),
    Event(EngineEvent),
}

impl Incoming {
    /// Classify a decoded message by its shape.
    pub fn parse(content: &str) -> EngineResult<Self> {
        let value: Value = serde_json::from_str(content)?;
        let Some(object) = value.as_object() else {
            return Err(EngineError::protocol("message is not an object"));
        };
        if object.contains_key("id") {
            Ok(Incoming::Response(serde_json::from_value(value)?))
        } else if object.contains_key("topic") {
            Ok(Incoming::Event(serde_json::from_value(value)?))
        } else {
            Err(EngineError::protocol("message has neither id nor topic"))
        }
    }
}

/// Write one framed message.
pub async fn write_message<W>(writer: &mut W, content: &str) -> EngineResult<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let message = format!("Content-Length: {}\r\n\r\n{}", content.len(), content);
    trace!(message = %content, "Sending engine message");
    writer.write_all(message.as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message. Returns `None` on a clean end of stream.
pub async fn read_message<R>(reader: &mut R) -> EngineResult<Option<String>>
where
    R: AsyncBufRead + Unpin + ?Sized,
{
    let mut content_length: Option<usize> = None;
    let mut saw_header = false;
    loop {
        let mut line = String::new();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            if saw_header {
                return Err(EngineError::Closed);
            }
            return Ok(None);
        }
        saw_header = true;

        let line = line.trim();
        if line.is_empty() {
            break;
        }

        if let Some(len_str) = line.strip_prefix("Content-Length:") {
            content_length = Some(
                len_str
                    .trim()
                    .parse()
                    .map_err(|_| EngineError::protocol("Invalid Content-Length"))?,
            );
        }
    }

    let content_length = content_length
        .ok_or_else(|| EngineError::protocol("Missing Content-Length header"))?;

    let mut content = vec![0u8; content_length];
    reader.read_exact(&mut content).await?;

    let content = String::from_utf8(content)
        .map_err(|e| EngineError::protocol(format!("Invalid UTF-8: {e}")))?;

    trace!(content = %content, "Received engine message");
    Ok(Some(content))
}
