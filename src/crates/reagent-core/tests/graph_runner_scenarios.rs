//! Black-box coverage of the graph interpreter's tight-loop abort, exercised
//! through the public API only (no access to `runner`'s internals).

use async_trait::async_trait;
use reagent_core::{Graph, GraphError, Message, Node, Result, RunContext, RunnerConfig};
use std::sync::Arc;

struct Passthrough;

#[async_trait]
impl Node for Passthrough {
    fn name(&self) -> &str {
        "node"
    }
    async fn process(&self, _ctx: &RunContext, input: Message) -> Result<Message> {
        Ok(input)
    }
}

/// A single node routes back to itself unconditionally; the interpreter must
/// abort with a tight-loop error well before the iteration budget runs out.
#[tokio::test]
async fn tight_loop_aborts_before_iteration_budget_is_exhausted() {
    let graph = Graph::builder("tight_loop")
        .add_node("a", Arc::new(Passthrough))
        .add_node("end", Arc::new(Passthrough))
        .add_conditional_edge("a", "a", |_ctx, _msg| true)
        .start_node("a")
        .end_node("end")
        .build()
        .unwrap();

    let config = RunnerConfig { max_iterations: 4, loop_detect: true };
    let result = reagent_core::run(&graph, &RunContext::new(), Message::user("hi"), config).await;
    assert!(matches!(result, Err(GraphError::TightLoop { .. })));
}

/// With loop detection switched off, the same shape instead runs to the
/// iteration budget and fails with `MaxIterationsExceeded`, not `TightLoop`.
#[tokio::test]
async fn tight_loop_without_detection_exhausts_iteration_budget_instead() {
    let graph = Graph::builder("tight_loop")
        .add_node("a", Arc::new(Passthrough))
        .add_node("end", Arc::new(Passthrough))
        .add_conditional_edge("a", "a", |_ctx, _msg| true)
        .start_node("a")
        .end_node("end")
        .build()
        .unwrap();

    let config = RunnerConfig { max_iterations: 4, loop_detect: false };
    let result = reagent_core::run(&graph, &RunContext::new(), Message::user("hi"), config).await;
    assert!(matches!(result, Err(GraphError::MaxIterationsExceeded(4))));
}
