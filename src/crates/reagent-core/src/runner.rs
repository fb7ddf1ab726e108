//! The queue-driven graph interpreter: one call stack, no supersteps.
//!
//! `run` collects the last node's output; `run_stream` forwards every
//! streaming node's events verbatim and additionally emits the interpreter's
//! own `node_start`/`node_output`/`routing_decision`/`execution_complete`
//! custom events so a caller can reconstruct execution without re-deriving
//! it from the graph.

use crate::context::RunContext;
use crate::error::{GraphError, Result};
use crate::event::Event;
use crate::graph::Graph;
use crate::messages::Message;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::{HashMap, VecDeque};
use tracing::debug;

#[derive(Debug, Clone, Copy)]
pub struct RunnerConfig {
    pub max_iterations: usize,
    pub loop_detect: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_iterations: 10, loop_detect: true }
    }
}

/// Run `graph` to completion, returning the output of whichever end node is
/// reached. See module docs for the algorithm.
pub async fn run(
    graph: &Graph,
    ctx: &RunContext,
    input: Message,
    config: RunnerConfig,
) -> Result<Message> {
    let mut queue: VecDeque<String> = VecDeque::new();
    queue.push_back(graph.start_node.clone());
    let mut visits: HashMap<String, usize> = HashMap::new();
    let mut iter = 0usize;
    let mut current_input = input;

    while let Some(node_id) = queue.pop_front() {
        if ctx.is_cancelled() {
            return Err(GraphError::Canceled);
        }
        if iter >= config.max_iterations {
            return Err(GraphError::MaxIterationsExceeded(config.max_iterations));
        }
        iter += 1;
        let visit_count = visits.entry(node_id.clone()).or_insert(0);
        *visit_count += 1;
        let visit_count = *visit_count;

        if config.loop_detect && visit_count > config.max_iterations / 2 {
            return Err(GraphError::TightLoop { node: node_id, visits: visit_count });
        }

        let node = graph
            .nodes
            .get(&node_id)
            .ok_or_else(|| GraphError::Validation(format!("unknown node '{node_id}'")))?;

        debug!(node = %node_id, iteration = iter, "graph node processing");
        let out = node
            .process(ctx, current_input.clone())
            .await
            .map_err(|e| GraphError::node_failed(node_id.clone(), iter, e))?;
        current_input = out.clone();

        if graph.is_end_node(&node_id) {
            return Ok(out);
        }

        for edge in graph.edges_from(&node_id) {
            if edge.fires(ctx, &out) {
                queue.push_back(edge.to.clone());
            }
        }
    }

    Err(GraphError::NoEndNodeReached)
}

/// Streaming counterpart: forwards each streaming-capable node's events and
/// interleaves interpreter-level bookkeeping events.
pub fn run_stream(
    graph: &Graph,
    ctx: RunContext,
    input: Message,
    config: RunnerConfig,
) -> BoxStream<'static, Event> {
    let graph_name = graph.name.clone();
    let nodes: HashMap<String, _> = graph.nodes.clone();
    let edges = graph.edges.clone();
    let start_node = graph.start_node.clone();
    let end_nodes = graph.end_nodes.clone();

    let stream = stream::unfold(
        StreamState {
            ctx,
            nodes,
            edges,
            end_nodes,
            queue: VecDeque::from([start_node]),
            visits: HashMap::new(),
            iter: 0,
            config,
            current_input: input,
            done: false,
            pending: VecDeque::new(),
            graph_name,
        },
        |mut state| async move {
            if let Some(ev) = state.pending.pop_front() {
                return Some((ev, state));
            }
            if state.done {
                return None;
            }
            match state.step().await {
                Ok(Some(ev)) => Some((ev, state)),
                Ok(None) => {
                    state.done = true;
                    None
                }
                Err(e) => {
                    state.done = true;
                    Some((Event::error(500, e.to_string()), state))
                }
            }
        },
    );

    stream.boxed()
}

struct StreamState {
    ctx: RunContext,
    nodes: HashMap<String, std::sync::Arc<dyn crate::node::Node>>,
    edges: Vec<crate::graph::Edge>,
    end_nodes: std::collections::HashSet<String>,
    queue: VecDeque<String>,
    visits: HashMap<String, usize>,
    iter: usize,
    config: RunnerConfig,
    current_input: Message,
    done: bool,
    pending: VecDeque<Event>,
    graph_name: String,
}

impl StreamState {
    async fn step(&mut self) -> Result<Option<Event>> {
        let Some(node_id) = self.queue.pop_front() else {
            return Ok(Some(Event::custom(
                "execution_complete",
                serde_json::json!({ "graph": self.graph_name, "reason": "no_end_node_reached" }),
            )));
        };

        if self.ctx.is_cancelled() {
            return Err(GraphError::Canceled);
        }
        if self.iter >= self.config.max_iterations {
            return Err(GraphError::MaxIterationsExceeded(self.config.max_iterations));
        }
        self.iter += 1;
        let visit_count = self.visits.entry(node_id.clone()).or_insert(0);
        *visit_count += 1;
        let visit_count = *visit_count;
        if self.config.loop_detect && visit_count > self.config.max_iterations / 2 {
            return Err(GraphError::TightLoop { node: node_id, visits: visit_count });
        }

        let node = self
            .nodes
            .get(&node_id)
            .ok_or_else(|| GraphError::Validation(format!("unknown node '{node_id}'")))?
            .clone();

        self.pending.push_back(Event::custom(
            "node_start",
            serde_json::json!({ "node": node_id, "iteration": self.iter }),
        ));

        let out = if node.supports_streaming() {
            let mut inner = node.process_stream(&self.ctx, self.current_input.clone()).await?;
            let mut last_text = None;
            while let Some(ev) = inner.next().await {
                if ev.event_type == crate::event::EventType::Message {
                    last_text = Some(ev.data.clone());
                }
                self.pending.push_back(ev);
            }
            let data = last_text.ok_or_else(|| {
                GraphError::node_failed(
                    node_id.clone(),
                    self.iter,
                    std::io::Error::new(std::io::ErrorKind::Other, "stream produced no output"),
                )
            })?;
            serde_json::from_value(data).map_err(GraphError::Serialization)?
        } else {
            let out = node
                .process(&self.ctx, self.current_input.clone())
                .await
                .map_err(|e| GraphError::node_failed(node_id.clone(), self.iter, e))?;
            self.pending
                .push_back(Event::message(serde_json::to_value(&out).map_err(GraphError::Serialization)?));
            out
        };

        self.current_input = out.clone();
        self.pending.push_back(Event::custom(
            "node_output",
            serde_json::json!({ "node": node_id }),
        ));

        if self.end_nodes.contains(&node_id) {
            self.pending.push_back(Event::custom(
                "execution_complete",
                serde_json::json!({ "graph": self.graph_name, "reason": "end_node" }),
            ));
            self.queue.clear();
        } else {
            for edge in self.edges.iter().filter(|e| e.from == node_id) {
                let fires = edge.fires(&self.ctx, &out);
                self.pending.push_back(Event::custom(
                    "routing_decision",
                    serde_json::json!({ "from": edge.from, "to": edge.to, "taken": fires }),
                ));
                if fires {
                    self.queue.push_back(edge.to.clone());
                }
            }
        }

        Ok(self.pending.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::messages::Message;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Passthrough(String);

    #[async_trait]
    impl crate::node::Node for Passthrough {
        fn name(&self) -> &str {
            &self.0
        }
        async fn process(&self, _ctx: &RunContext, input: Message) -> Result<Message> {
            Ok(input)
        }
    }

    struct AlwaysTrue(Arc<AtomicUsize>);

    #[async_trait]
    impl crate::node::Node for AlwaysTrue {
        fn name(&self) -> &str {
            "loopy"
        }
        async fn process(&self, _ctx: &RunContext, input: Message) -> Result<Message> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(input)
        }
    }

    #[tokio::test]
    async fn runs_sequential_graph_to_end() {
        let graph = Graph::builder("seq")
            .add_node("a", Arc::new(Passthrough("a".into())))
            .add_node("b", Arc::new(Passthrough("b".into())))
            .add_edge("a", "b")
            .start_node("a")
            .end_node("b")
            .build()
            .unwrap();

        let out = run(&graph, &RunContext::new(), Message::user("hi"), RunnerConfig::default())
            .await
            .unwrap();
        assert_eq!(out.text(), "hi");
    }

    #[tokio::test]
    async fn aborts_on_tight_loop() {
        let visits = Arc::new(AtomicUsize::new(0));
        // "end" is never reachable: "a" self-loops unconditionally, so the
        // visit-count check must be what stops the run, not MaxIterationsExceeded
        // and not an end-node hit.
        let graph = Graph::builder("loop")
            .add_node("a", Arc::new(AlwaysTrue(visits.clone())))
            .add_node("end", Arc::new(Passthrough("end".into())))
            .add_conditional_edge("a", "a", |_ctx, _msg| true)
            .start_node("a")
            .end_node("end")
            .build()
            .unwrap();

        let config = RunnerConfig { max_iterations: 4, loop_detect: true };
        let result = run(&graph, &RunContext::new(), Message::user("hi"), config).await;
        assert!(matches!(result, Err(GraphError::TightLoop { .. })));
    }

    #[tokio::test]
    async fn errors_when_no_end_node_reached() {
        let graph = Graph::builder("dead_end")
            .add_node("a", Arc::new(Passthrough("a".into())))
            .add_node("b", Arc::new(Passthrough("b".into())))
            .add_conditional_edge("a", "b", |_ctx, _msg| false)
            .start_node("a")
            .end_node("b")
            .build()
            .unwrap();

        let result = run(&graph, &RunContext::new(), Message::user("hi"), RunnerConfig::default()).await;
        assert!(matches!(result, Err(GraphError::NoEndNodeReached)));
    }
}
