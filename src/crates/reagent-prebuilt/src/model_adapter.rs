//! Adapts a [`reagent_llm::Model`] to the collaborator traits the engine
//! drives. A model that already emits tool calls alongside its text makes
//! the action selector a pass-through over what the thought carries; a
//! model with nothing to add to a cycle's observations drives the fallback
//! response synthesis too.

use crate::collaborators::{ActionSelector, ResponseGenerator, ThoughtGenerator};
use crate::error::{PrebuiltError, Result};
use crate::types::{Cycle, SuggestedAction, Thought};
use async_trait::async_trait;
use reagent_core::{Message, RunContext};
use reagent_llm::{GenerateOptions, Model};
use reagent_tools::Tool;
use std::sync::Arc;

pub struct ModelThoughtGenerator {
    model: Arc<dyn Model>,
    system_prompt: String,
}

impl ModelThoughtGenerator {
    pub fn new(model: Arc<dyn Model>, system_prompt: impl Into<String>) -> Self {
        Self { model, system_prompt: system_prompt.into() }
    }

    fn build_messages(&self, user_messages: &[Message], history: &[Cycle]) -> Vec<Message> {
        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(user_messages.iter().cloned());
        for cycle in history {
            messages.push(Message::assistant(cycle.thought.content.clone()));
            for observation in &cycle.observations {
                let value = observation
                    .tool_output
                    .get("output")
                    .or_else(|| observation.tool_output.get("error"))
                    .cloned()
                    .unwrap_or(serde_json::Value::Null);
                messages.push(Message::tool(value.to_string()));
            }
        }
        messages
    }
}

#[async_trait]
impl ThoughtGenerator for ModelThoughtGenerator {
    async fn generate(
        &self,
        ctx: &RunContext,
        user_messages: &[Message],
        history: &[Cycle],
        tools: &[Arc<dyn Tool>],
    ) -> Result<Thought> {
        if ctx.is_cancelled() {
            return Err(PrebuiltError::Canceled);
        }

        let messages = self.build_messages(user_messages, history);
        let options = GenerateOptions { enable_tool_calls: !tools.is_empty(), ..Default::default() };
        let response = self
            .model
            .generate_with_messages(&messages, &options)
            .await
            .map_err(|e| PrebuiltError::ThoughtGeneration(e.to_string()))?;

        let suggested_actions = if response.tool_calls.is_empty() {
            None
        } else {
            Some(
                response
                    .tool_calls
                    .iter()
                    .map(|call| SuggestedAction {
                        tool_name: call.function.name.clone(),
                        tool_input: serde_json::from_str(&call.function.arguments).unwrap_or_default(),
                    })
                    .collect(),
            )
        };

        let mut thought = Thought::new(response.text);
        thought.suggested_actions = suggested_actions;
        Ok(thought)
    }
}

pub struct PassthroughActionSelector;

#[async_trait]
impl ActionSelector for PassthroughActionSelector {
    async fn select(&self, _ctx: &RunContext, thought: &Thought, _tools: &[Arc<dyn Tool>]) -> Result<Vec<SuggestedAction>> {
        Ok(thought.suggested_actions.clone().unwrap_or_default())
    }
}

pub struct ModelResponseGenerator {
    model: Arc<dyn Model>,
}

impl ModelResponseGenerator {
    pub fn new(model: Arc<dyn Model>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl ResponseGenerator for ModelResponseGenerator {
    async fn generate(&self, ctx: &RunContext, partial_text: &str, messages: &[Message], history: &[Cycle]) -> Result<String> {
        if ctx.is_cancelled() {
            return Err(PrebuiltError::Canceled);
        }

        let mut prompt_messages = messages.to_vec();
        for cycle in history {
            prompt_messages.push(Message::assistant(cycle.thought.content.clone()));
        }
        if !partial_text.is_empty() {
            prompt_messages.push(Message::assistant(partial_text.to_string()));
        }
        prompt_messages.push(Message::system(
            "The iteration budget is exhausted. Summarize what was learned into a final answer.",
        ));

        let response = self
            .model
            .generate_with_messages(&prompt_messages, &GenerateOptions::default())
            .await
            .map_err(|e| PrebuiltError::ResponseGeneration(e.to_string()))?;
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_llm::{GenerateResponse, ScriptedModel};

    #[tokio::test]
    async fn thought_generator_converts_tool_calls_into_suggested_actions() {
        let model = Arc::new(ScriptedModel::new(vec![GenerateResponse {
            messages: vec![],
            text: "I should check the weather".into(),
            tool_calls: vec![reagent_llm::ToolCall {
                id: "call-1".into(),
                function: reagent_llm::FunctionCall { name: "weather".into(), arguments: "{\"city\":\"nyc\"}".into() },
            }],
            finish_reason: reagent_llm::FinishReason::ToolCalls,
        }]));
        let generator = ModelThoughtGenerator::new(model, "you are an agent");
        let ctx = RunContext::new();
        let thought = generator.generate(&ctx, &[Message::user("what's the weather")], &[], &[]).await.unwrap();
        let actions = thought.suggested_actions.unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].tool_name, "weather");
    }
}
