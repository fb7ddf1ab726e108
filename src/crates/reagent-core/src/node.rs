//! The node contract every graph participant implements.

use crate::context::RunContext;
use crate::error::Result;
use crate::event::Event;
use crate::messages::Message;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// A unit of work in a [`crate::graph::Graph`].
///
/// `process_stream`'s default implementation calls `process` and wraps its
/// output as a single `message` event — the graph runner relies on this so
/// non-streaming nodes still produce a coherent event in a streaming run.
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, ctx: &RunContext, input: Message) -> Result<Message>;

    async fn process_stream(&self, ctx: &RunContext, input: Message) -> Result<BoxStream<'static, Event>> {
        let output = self.process(ctx, input).await?;
        let event = Event::message(serde_json::to_value(&output)?);
        Ok(Box::pin(futures::stream::once(async move { event })))
    }

    fn supports_streaming(&self) -> bool {
        false
    }
}
