//! The ReAct loop: thought → (final answer | actions → observations),
//! repeated up to `max_iterations` times, in both a synchronous
//! collect-the-answer mode and a streaming mode that forwards an `Event`
//! per step.

use crate::collaborators::{ActionSelector, ResponseGenerator, StreamingThoughtGenerator, ThoughtGenerator};
use crate::cycle_manager::CycleManager;
use crate::error::{PrebuiltError, Result};
use crate::types::{extract_final_answer, Action, Cycle, CycleObservation, Thought};
use futures::stream::{BoxStream, StreamExt};
use reagent_core::{Event, Message, RunContext};
use reagent_tools::{Tool, ToolError, ToolRegistry};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

const DEFAULT_MAX_ITERATIONS: usize = 10;
const STREAMING_THOUGHT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

enum CycleOutcome {
    FinalAnswer(String),
    Continue,
}

pub struct ReActEngine {
    thought_generator: Arc<dyn ThoughtGenerator>,
    streaming_thought_generator: Option<Arc<dyn StreamingThoughtGenerator>>,
    action_selector: Arc<dyn ActionSelector>,
    response_generator: Option<Arc<dyn ResponseGenerator>>,
    cycle_manager: Arc<CycleManager>,
    tools: Arc<ToolRegistry>,
    max_iterations: AtomicUsize,
}

pub struct ReActEngineBuilder {
    thought_generator: Option<Arc<dyn ThoughtGenerator>>,
    streaming_thought_generator: Option<Arc<dyn StreamingThoughtGenerator>>,
    action_selector: Option<Arc<dyn ActionSelector>>,
    response_generator: Option<Arc<dyn ResponseGenerator>>,
    cycle_manager: Option<Arc<CycleManager>>,
    tools: Option<Arc<ToolRegistry>>,
    max_iterations: usize,
}

impl Default for ReActEngineBuilder {
    fn default() -> Self {
        Self {
            thought_generator: None,
            streaming_thought_generator: None,
            action_selector: None,
            response_generator: None,
            cycle_manager: None,
            tools: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl ReActEngineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thought_generator(mut self, g: Arc<dyn ThoughtGenerator>) -> Self {
        self.thought_generator = Some(g);
        self
    }

    pub fn streaming_thought_generator(mut self, g: Arc<dyn StreamingThoughtGenerator>) -> Self {
        self.streaming_thought_generator = Some(g);
        self
    }

    pub fn action_selector(mut self, s: Arc<dyn ActionSelector>) -> Self {
        self.action_selector = Some(s);
        self
    }

    pub fn response_generator(mut self, g: Arc<dyn ResponseGenerator>) -> Self {
        self.response_generator = Some(g);
        self
    }

    pub fn cycle_manager(mut self, m: Arc<CycleManager>) -> Self {
        self.cycle_manager = Some(m);
        self
    }

    pub fn tools(mut self, tools: Arc<ToolRegistry>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Fails with a config error if a required collaborator is missing:
    /// thought generator, action selector, cycle manager, and tools are
    /// mandatory; a response generator is optional (there is a built-in
    /// fallback synthesis path).
    pub fn build(self) -> std::result::Result<ReActEngine, String> {
        Ok(ReActEngine {
            thought_generator: self.thought_generator.ok_or("thought generator is required")?,
            streaming_thought_generator: self.streaming_thought_generator,
            action_selector: self.action_selector.ok_or("action selector is required")?,
            response_generator: self.response_generator,
            cycle_manager: self.cycle_manager.ok_or("cycle manager is required")?,
            tools: self.tools.ok_or("tool registry is required")?,
            max_iterations: AtomicUsize::new(self.max_iterations),
        })
    }
}

impl ReActEngine {
    pub fn builder() -> ReActEngineBuilder {
        ReActEngineBuilder::new()
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations.load(Ordering::SeqCst)
    }

    pub fn set_max_iterations(&self, n: usize) {
        self.max_iterations.store(n, Ordering::SeqCst);
    }

    fn tools_snapshot(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .list_tools()
            .iter()
            .filter_map(|name| self.tools.get(name).cloned())
            .collect()
    }

    fn thought_is_final_answer(thought: &Thought) -> bool {
        if let Some(actions) = &thought.suggested_actions {
            if actions.first().map(|a| a.tool_name == "final_answer").unwrap_or(false) {
                return true;
            }
        }
        crate::types::contains_final_answer_marker(&thought.content)
    }

    fn final_answer_tool_input(action: &Action) -> String {
        action
            .tool_input
            .get("answer")
            .or_else(|| action.tool_input.get("content"))
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| "I've completed my analysis.".to_string())
    }

    async fn dispatch_one(&self, ctx: &RunContext, action: &Action) -> CycleObservation {
        match self.tools.execute(ctx, &action.tool_name, action.tool_input.clone()).await {
            Ok(result) => CycleObservation::success(action.id.clone(), result.output),
            Err(ToolError::NotFound(name)) => {
                CycleObservation::error(action.id.clone(), format!("tool {name} not found"))
            }
            Err(e) => CycleObservation::error(action.id.clone(), e.to_string()),
        }
    }

    async fn dispatch_actions(&self, ctx: &RunContext, actions: &[Action]) -> Vec<CycleObservation> {
        let futures = actions.iter().map(|action| self.dispatch_one(ctx, action));
        futures::future::join_all(futures).await
    }

    async fn synthesize_fallback(&self, ctx: &RunContext, messages: &[Message], cycles: &[Cycle]) -> Result<String> {
        if let Some(generator) = &self.response_generator {
            return generator.generate(ctx, "", messages, cycles).await;
        }
        let mut text = String::from("Based on my analysis:");
        for cycle in cycles {
            for obs in &cycle.observations {
                if let Some(output) = obs.tool_output.get("output") {
                    text.push_str(&format!("\n- {output}"));
                }
            }
        }
        Ok(text)
    }

    async fn drive_cycle(&self, ctx: &RunContext, thought: &Thought, tools: &[Arc<dyn Tool>]) -> Result<CycleOutcome> {
        if Self::thought_is_final_answer(thought) {
            return Ok(CycleOutcome::FinalAnswer(extract_final_answer(&thought.content)));
        }

        let suggested = self.action_selector.select(ctx, thought, tools).await?;
        let actions: Vec<Action> = suggested
            .into_iter()
            .map(|s| Action::new(thought.id.clone(), s.tool_name, s.tool_input))
            .collect();
        self.cycle_manager.record_actions(actions.clone())?;

        if let Some(final_action) = actions.iter().find(|a| a.tool_name == "final_answer") {
            let text = Self::final_answer_tool_input(final_action);
            let observation = CycleObservation::success(final_action.id.clone(), serde_json::json!(text));
            self.cycle_manager.record_observations(vec![observation])?;
            return Ok(CycleOutcome::FinalAnswer(text));
        }

        let observations = self.dispatch_actions(ctx, &actions).await;
        self.cycle_manager.record_observations(observations)?;
        Ok(CycleOutcome::Continue)
    }

    /// Sync entry point: `Run(ctx, userMessage) → assistantMessage | error`.
    pub async fn run(&self, ctx: &RunContext, user_message: Message) -> Result<Message> {
        let max_iterations = self.max_iterations();
        let user_messages = vec![user_message];

        if max_iterations == 0 {
            let text = self.synthesize_fallback(ctx, &user_messages, &[]).await?;
            return Ok(Message::assistant(text));
        }

        let tools = self.tools_snapshot();

        for _ in 0..max_iterations {
            if ctx.is_cancelled() {
                return Err(PrebuiltError::Canceled);
            }

            let cycles = self.cycle_manager.get_history().await;
            let thought = self
                .thought_generator
                .generate(ctx, &user_messages, &cycles, &tools)
                .await?;

            self.cycle_manager.start_cycle(thought.clone())?;
            let outcome = self.drive_cycle(ctx, &thought, &tools).await;
            self.cycle_manager.end_cycle().await?;

            match outcome? {
                CycleOutcome::FinalAnswer(text) => return Ok(Message::assistant(text)),
                CycleOutcome::Continue => continue,
            }
        }

        let cycles = self.cycle_manager.get_history().await;
        let text = self.synthesize_fallback(ctx, &user_messages, &cycles).await?;
        Ok(Message::assistant(text))
    }

    /// Streaming entry point: `RunAsync(ctx, userMessage) → channel of
    /// Event`. `session_id` is only used to stamp the `stream_start` event.
    pub fn run_async(
        self: Arc<Self>,
        ctx: RunContext,
        user_message: Message,
        session_id: impl Into<String>,
    ) -> BoxStream<'static, Event> {
        let (tx, rx) = tokio::sync::mpsc::channel(64);
        let session_id = session_id.into();
        tokio::spawn(async move {
            self.run_async_inner(ctx, user_message, session_id, tx).await;
        });
        ReceiverStream::new(rx).boxed()
    }

    async fn run_async_inner(
        &self,
        ctx: RunContext,
        user_message: Message,
        session_id: String,
        tx: tokio::sync::mpsc::Sender<Event>,
    ) {
        let _ = tx.send(Event::stream_start(session_id)).await;

        let max_iterations = self.max_iterations();
        let user_messages = vec![user_message];

        if max_iterations == 0 {
            let text = match self.synthesize_fallback(&ctx, &user_messages, &[]).await {
                Ok(t) => t,
                Err(e) => {
                    let _ = tx.send(Event::error(500, e.to_string())).await;
                    return;
                }
            };
            let _ = tx.send(Event::message(serde_json::json!({ "text": text }))).await;
            let _ = tx.send(Event::stream_end(text)).await;
            return;
        }

        let tools = self.tools_snapshot();
        let mut final_text: Option<String> = None;

        for iteration in 0..max_iterations {
            if ctx.is_cancelled() {
                self.handle_cancellation(&tx).await;
                return;
            }

            let cycles = self.cycle_manager.get_history().await;
            let thought = match self
                .generate_thought_streaming(&ctx, &user_messages, &cycles, &tools, iteration, &tx)
                .await
            {
                Ok(Some(thought)) => thought,
                Ok(None) => continue,
                Err(e) => {
                    let _ = tx.send(Event::error(500, e.to_string())).await;
                    continue;
                }
            };

            if let Err(e) = self.cycle_manager.start_cycle(thought.clone()) {
                let _ = tx.send(Event::error(500, e.to_string())).await;
                return;
            }

            let outcome = self
                .drive_cycle_streaming(&ctx, &thought, &tools, &tx)
                .await;

            if let Err(e) = self.cycle_manager.end_cycle().await {
                let _ = tx.send(Event::error(500, e.to_string())).await;
                return;
            }

            match outcome {
                Ok(CycleOutcome::FinalAnswer(text)) => {
                    final_text = Some(text);
                    break;
                }
                Ok(CycleOutcome::Continue) => continue,
                Err(e) => {
                    let _ = tx.send(Event::error(500, e.to_string())).await;
                    continue;
                }
            }
        }

        let text = match final_text {
            Some(t) => t,
            None => {
                let cycles = self.cycle_manager.get_history().await;
                match self.synthesize_fallback(&ctx, &user_messages, &cycles).await {
                    Ok(t) => t,
                    Err(e) => {
                        let _ = tx.send(Event::error(500, e.to_string())).await;
                        return;
                    }
                }
            }
        };

        let _ = tx.send(Event::message(serde_json::json!({ "text": text }))).await;
        let _ = tx.send(Event::stream_end(text)).await;
    }

    /// Drains in-flight producers, ends the active cycle, and emits the
    /// canonical cancellation error.
    async fn handle_cancellation(&self, tx: &tokio::sync::mpsc::Sender<Event>) {
        if self.cycle_manager.current_cycle().is_some() {
            let _ = self.cycle_manager.end_cycle().await;
        }
        let _ = tx.send(Event::error(499, "canceled")).await;
    }

    /// `Ok(Some(thought))` on success, `Ok(None)` when the idle timeout fired
    /// with nothing captured (iteration is skipped but still counts toward
    /// the iteration budget).
    async fn generate_thought_streaming(
        &self,
        ctx: &RunContext,
        user_messages: &[Message],
        cycles: &[Cycle],
        tools: &[Arc<dyn Tool>],
        iteration: usize,
        tx: &tokio::sync::mpsc::Sender<Event>,
    ) -> Result<Option<Thought>> {
        let Some(streaming) = &self.streaming_thought_generator else {
            let thought = self.thought_generator.generate(ctx, user_messages, cycles, tools).await?;
            let _ = tx
                .send(Event::message(serde_json::json!({ "content": thought.content })))
                .await;
            return Ok(Some(thought));
        };

        let mut stream = streaming.generate_stream(ctx, user_messages, cycles, tools).await?;
        let mut accumulated = String::new();
        let mut suggested_actions = None;
        let mut captured_any = false;

        loop {
            match tokio::time::timeout(STREAMING_THOUGHT_IDLE_TIMEOUT, stream.next()).await {
                Ok(Some(partial)) => {
                    captured_any = true;
                    accumulated.push_str(&partial.content_delta);
                    if partial.suggested_actions.is_some() {
                        suggested_actions = partial.suggested_actions;
                    }
                    let _ = tx.send(Event::stream_chunk(partial.content_delta, iteration)).await;
                }
                Ok(None) => break,
                Err(_elapsed) => {
                    debug!(iteration, "thought stream idle timeout, draining and proceeding");
                    drain(&mut stream).await;
                    break;
                }
            }
        }

        if !captured_any {
            return Ok(None);
        }

        let mut thought = Thought::new(accumulated);
        thought.suggested_actions = suggested_actions;
        Ok(Some(thought))
    }

    async fn drive_cycle_streaming(
        &self,
        ctx: &RunContext,
        thought: &Thought,
        tools: &[Arc<dyn Tool>],
        tx: &tokio::sync::mpsc::Sender<Event>,
    ) -> Result<CycleOutcome> {
        if Self::thought_is_final_answer(thought) {
            return Ok(CycleOutcome::FinalAnswer(extract_final_answer(&thought.content)));
        }

        let suggested = self.action_selector.select(ctx, thought, tools).await?;
        let actions: Vec<Action> = suggested
            .into_iter()
            .map(|s| Action::new(thought.id.clone(), s.tool_name, s.tool_input))
            .collect();
        self.cycle_manager.record_actions(actions.clone())?;

        if let Some(final_action) = actions.iter().find(|a| a.tool_name == "final_answer") {
            let text = Self::final_answer_tool_input(final_action);
            let observation = CycleObservation::success(final_action.id.clone(), serde_json::json!(text));
            self.cycle_manager.record_observations(vec![observation])?;
            return Ok(CycleOutcome::FinalAnswer(text));
        }

        for action in &actions {
            let args_json = serde_json::to_string(&action.tool_input).unwrap_or_default();
            let _ = tx
                .send(Event::stream_tool_call(action.tool_name.clone(), args_json, action.id.clone()))
                .await;
        }

        let observations = self.dispatch_actions(ctx, &actions).await;
        for (action, observation) in actions.iter().zip(observations.iter()) {
            let (result, error) = if observation.is_error {
                (serde_json::Value::Null, observation.tool_output.get("error").cloned())
            } else {
                (observation.tool_output.get("output").cloned().unwrap_or(serde_json::Value::Null), None)
            };
            let _ = tx
                .send(Event::stream_tool_result(
                    action.tool_name.clone(),
                    result,
                    error.and_then(|v| v.as_str().map(String::from)),
                ))
                .await;
        }

        self.cycle_manager.record_observations(observations)?;
        Ok(CycleOutcome::Continue)
    }
}

async fn drain<S: futures::Stream + Unpin>(stream: &mut S) {
    while tokio::time::timeout(Duration::from_millis(50), stream.next()).await.is_ok() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{ActionSelector, ResponseGenerator, ThoughtGenerator};
    use crate::types::SuggestedAction;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex as StdMutex;

    struct FixedThoughts(StdMutex<Vec<String>>);

    #[async_trait]
    impl ThoughtGenerator for FixedThoughts {
        async fn generate(
            &self,
            _ctx: &RunContext,
            _user_messages: &[Message],
            _history: &[Cycle],
            _tools: &[Arc<dyn Tool>],
        ) -> Result<Thought> {
            let mut remaining = self.0.lock().unwrap();
            let content = if remaining.is_empty() { "Final answer: done".to_string() } else { remaining.remove(0) };
            Ok(Thought::new(content))
        }
    }

    struct NoActions;

    #[async_trait]
    impl ActionSelector for NoActions {
        async fn select(&self, _ctx: &RunContext, _thought: &Thought, _tools: &[Arc<dyn Tool>]) -> Result<Vec<SuggestedAction>> {
            Ok(vec![])
        }
    }

    struct OneAction(&'static str);

    #[async_trait]
    impl ActionSelector for OneAction {
        async fn select(&self, _ctx: &RunContext, _thought: &Thought, _tools: &[Arc<dyn Tool>]) -> Result<Vec<SuggestedAction>> {
            Ok(vec![SuggestedAction { tool_name: self.0.to_string(), tool_input: HashMap::new() }])
        }
    }

    fn engine_with(thought_generator: Arc<dyn ThoughtGenerator>, action_selector: Arc<dyn ActionSelector>) -> ReActEngine {
        ReActEngine::builder()
            .thought_generator(thought_generator)
            .action_selector(action_selector)
            .cycle_manager(Arc::new(CycleManager::new()))
            .tools(Arc::new(ToolRegistry::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn single_shot_final_answer() {
        let engine = engine_with(
            Arc::new(FixedThoughts(StdMutex::new(vec!["Final answer: hello".into()]))),
            Arc::new(NoActions),
        );
        let result = engine.run(&RunContext::new(), Message::user("hi")).await.unwrap();
        assert_eq!(result.text(), "hello");
    }

    #[tokio::test]
    async fn zero_max_iterations_skips_thought_generation() {
        let engine = engine_with(Arc::new(FixedThoughts(StdMutex::new(vec![]))), Arc::new(NoActions));
        engine.set_max_iterations(0);
        let result = engine.run(&RunContext::new(), Message::user("hi")).await.unwrap();
        assert!(result.text().starts_with("Based on my analysis:"));
    }

    #[tokio::test]
    async fn final_answer_tool_short_circuits() {
        let engine = engine_with(
            Arc::new(FixedThoughts(StdMutex::new(vec!["I should answer".into()]))),
            Arc::new(OneAction("final_answer")),
        );
        let result = engine.run(&RunContext::new(), Message::user("hi")).await.unwrap();
        assert_eq!(result.text(), "I've completed my analysis.");
    }

    #[tokio::test]
    async fn missing_tool_produces_error_observation_and_continues() {
        let engine = engine_with(
            Arc::new(FixedThoughts(StdMutex::new(vec!["I should compute".into(), "Final answer: ok".into()]))),
            Arc::new(OneAction("does_not_exist")),
        );
        let result = engine.run(&RunContext::new(), Message::user("hi")).await.unwrap();
        assert_eq!(result.text(), "ok");
    }

    struct EchoResponder;

    #[async_trait]
    impl ResponseGenerator for EchoResponder {
        async fn generate(&self, _ctx: &RunContext, _partial: &str, _messages: &[Message], _history: &[Cycle]) -> Result<String> {
            Ok("fallback response".into())
        }
    }

    #[tokio::test]
    async fn iteration_budget_exhaustion_uses_response_generator() {
        let engine = ReActEngine::builder()
            .thought_generator(Arc::new(FixedThoughts(StdMutex::new(vec!["still thinking".into(), "still thinking".into()]))))
            .action_selector(Arc::new(NoActions))
            .response_generator(Arc::new(EchoResponder))
            .cycle_manager(Arc::new(CycleManager::new()))
            .tools(Arc::new(ToolRegistry::new()))
            .max_iterations(2)
            .build()
            .unwrap();
        let result = engine.run(&RunContext::new(), Message::user("hi")).await.unwrap();
        assert_eq!(result.text(), "fallback response");
    }
}
