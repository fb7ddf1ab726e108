//! The `Model` contract: language models live outside this crate — it only
//! defines what the engine is allowed to assume about one.

use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use reagent_core::Message;
use serde::{Deserialize, Serialize};

/// A tool call a model chose to make.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Arguments as a JSON string, exactly as the model emitted them —
    /// callers parse this themselves rather than the contract guessing a
    /// shape.
    pub arguments: String,
}

/// Why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
    ContentFilter,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub enable_tool_calls: bool,
    pub stream: bool,
}

#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub messages: Vec<Message>,
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
}

impl GenerateResponse {
    pub fn text_only(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            messages: vec![Message::assistant(text.clone())],
            text,
            tool_calls: Vec::new(),
            finish_reason: FinishReason::Stop,
        }
    }
}

/// A partial response emitted on the streaming path — same shape as
/// [`GenerateResponse`] but `text` holds only the incremental delta.
pub type GenerateChunk = GenerateResponse;

#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_with_messages(
        &self,
        messages: &[Message],
        options: &GenerateOptions,
    ) -> Result<GenerateResponse>;

    /// Streaming counterpart. The default says "not supported"; models that
    /// can stream override both this and [`Model::supports_streaming`].
    async fn generate_stream_with_messages(
        &self,
        _messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<BoxStream<'static, Result<GenerateChunk>>> {
        Err(crate::error::LlmError::Unavailable(
            "this model does not support streaming".into(),
        ))
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    async fn is_available(&self) -> bool {
        true
    }
}
