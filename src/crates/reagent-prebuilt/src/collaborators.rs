//! The three pluggable collaborators the ReAct engine drives: something
//! that produces a thought, something that turns a thought into actions,
//! and something that synthesizes a fallback response when the iteration
//! budget runs out.

use crate::error::Result;
use crate::types::{Cycle, SuggestedAction, Thought};
use async_trait::async_trait;
use futures::stream::BoxStream;
use reagent_core::{Message, RunContext};
use reagent_tools::Tool;
use std::sync::Arc;

#[async_trait]
pub trait ThoughtGenerator: Send + Sync {
    async fn generate(
        &self,
        ctx: &RunContext,
        user_messages: &[Message],
        history: &[Cycle],
        tools: &[Arc<dyn Tool>],
    ) -> Result<Thought>;
}

/// One partial update on the streaming thought-generation path: incremental
/// text, and, once available, the suggested actions the complete thought
/// will carry.
#[derive(Debug, Clone, Default)]
pub struct ThoughtPartial {
    pub content_delta: String,
    pub suggested_actions: Option<Vec<SuggestedAction>>,
}

#[async_trait]
pub trait StreamingThoughtGenerator: ThoughtGenerator {
    async fn generate_stream(
        &self,
        ctx: &RunContext,
        user_messages: &[Message],
        history: &[Cycle],
        tools: &[Arc<dyn Tool>],
    ) -> Result<BoxStream<'static, ThoughtPartial>>;
}

#[async_trait]
pub trait ActionSelector: Send + Sync {
    async fn select(&self, ctx: &RunContext, thought: &Thought, tools: &[Arc<dyn Tool>]) -> Result<Vec<SuggestedAction>>;
}

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, ctx: &RunContext, partial_text: &str, messages: &[Message], history: &[Cycle]) -> Result<String>;
}
