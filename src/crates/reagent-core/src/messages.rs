//! Message types shared by the graph runner, the ReAct engine, and tool/model
//! interfaces.
//!
//! A [`Message`] carries a [`MessageRole`] and either a plain string or an
//! ordered sequence of [`ContentPart`]s, plus a metadata map. Content is
//! immutable after construction except through the explicit `add_part`/
//! `set_metadata` mutators below — callers that need a private copy should
//! `clone()` the message first.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Who produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
    Function,
}

/// One part of a multi-part message body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { url: String },
    FileUrl { url: String },
    Json { data: Value },
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    pub fn image_url(url: impl Into<String>) -> Self {
        ContentPart::ImageUrl { url: url.into() }
    }

    pub fn file_url(url: impl Into<String>) -> Self {
        ContentPart::FileUrl { url: url.into() }
    }

    pub fn json(data: Value) -> Self {
        ContentPart::Json { data }
    }
}

/// Message body: either a plain string or an ordered list of parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl MessageContent {
    /// Best-effort flattening to plain text, used by the engine when it
    /// needs to hand content to a prompt template or a final-answer scan.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| match p {
                    ContentPart::Text { text } => Some(text.clone()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// A single message in a conversation.
///
/// Identity (`id`) is stable once assigned; content is mutated only through
/// [`Message::add_part`] and [`Message::set_metadata`]. A `Message` is owned
/// by whoever holds the reference and is never shared for write across
/// threads — clone it before handing it to another task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: MessageRole,
    pub content: MessageContent,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<MessageContent>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn tool(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Tool, content)
    }

    /// Append a part to the message, converting a plain-text body into a
    /// one-part sequence first if needed.
    pub fn add_part(&mut self, part: ContentPart) {
        match &mut self.content {
            MessageContent::Parts(parts) => parts.push(part),
            MessageContent::Text(text) => {
                let existing = ContentPart::text(text.clone());
                self.content = MessageContent::Parts(vec![existing, part]);
            }
        }
    }

    /// Set or overwrite a metadata key. Keys are unique; a second call with
    /// the same key replaces the prior value.
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_part_upgrades_text_to_parts() {
        let mut msg = Message::user("hello");
        msg.add_part(ContentPart::image_url("https://example.com/a.png"));
        match msg.content {
            MessageContent::Parts(ref parts) => assert_eq!(parts.len(), 2),
            _ => panic!("expected parts"),
        }
    }

    #[test]
    fn copy_isolation() {
        let original = Message::user("hi");
        let mut copy = original.clone();
        copy.set_metadata("k", serde_json::json!("v"));
        copy.add_part(ContentPart::text("more"));
        assert!(original.metadata.is_empty());
        assert_eq!(original.text(), "hi");
    }
}
