//! The typed event stream emitted by the ReAct engine and the graph runner.
//!
//! `EventType` is a closed set — consumers bridging to a transport (SSE, a
//! websocket, ...) can match on it exhaustively. `Event` itself never nests
//! a second event; it is the terminal unit of the stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Closed set of event kinds the core ever emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Message,
    Tool,
    Error,
    Agent,
    System,
    Evaluation,
    Custom,
    StreamStart,
    StreamChunk,
    StreamToolCall,
    StreamToolResult,
    StreamEnd,
}

/// A single emission on a streaming run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub data: Value,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Event {
    fn new(event_type: EventType, data: Value) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            name: None,
            created_at: Utc::now(),
            data,
            metadata: HashMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn message(data: Value) -> Self {
        Self::new(EventType::Message, data)
    }

    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::new(
            EventType::Error,
            serde_json::json!({ "code": code, "message": message.into() }),
        )
    }

    pub fn agent(data: Value) -> Self {
        Self::new(EventType::Agent, data)
    }

    pub fn system(data: Value) -> Self {
        Self::new(EventType::System, data)
    }

    pub fn custom(name: impl Into<String>, data: Value) -> Self {
        Self::new(EventType::Custom, data).with_name(name)
    }

    pub fn stream_start(session_id: impl Into<String>) -> Self {
        Self::new(
            EventType::StreamStart,
            serde_json::json!({ "session_id": session_id.into() }),
        )
    }

    pub fn stream_chunk(content: impl Into<String>, iteration: usize) -> Self {
        Self::new(
            EventType::StreamChunk,
            serde_json::json!({ "content": content.into(), "iteration": iteration }),
        )
    }

    pub fn stream_tool_call(name: impl Into<String>, arguments: impl Into<String>, id: impl Into<String>) -> Self {
        Self::new(
            EventType::StreamToolCall,
            serde_json::json!({ "name": name.into(), "arguments": arguments.into(), "id": id.into() }),
        )
    }

    pub fn stream_tool_result(name: impl Into<String>, result: Value, error: Option<String>) -> Self {
        Self::new(
            EventType::StreamToolResult,
            serde_json::json!({ "name": name.into(), "result": result, "error": error }),
        )
    }

    pub fn stream_end(complete_text: impl Into<String>) -> Self {
        Self::new(
            EventType::StreamEnd,
            serde_json::json!({ "text": complete_text.into() }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_start_carries_session_id() {
        let e = Event::stream_start("sess-1");
        assert_eq!(e.event_type, EventType::StreamStart);
        assert_eq!(e.data["session_id"], "sess-1");
    }
}
