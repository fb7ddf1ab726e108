//! Error types for graph construction and execution.

use thiserror::Error;

/// Result type for `reagent-core` operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised while building or running a [`crate::graph::Graph`].
#[derive(Error, Debug)]
pub enum GraphError {
    /// The graph failed validation at construction time (missing start/end
    /// node, duplicate node name, empty node set, ...).
    #[error("invalid graph: {0}")]
    Validation(String),

    /// A node's `process`/`process_stream` call returned an error.
    #[error("{node} failed (iter {iteration}): {source}")]
    NodeFailed {
        node: String,
        iteration: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The hard iteration cap (`max_iterations`) was reached before an end
    /// node was produced.
    #[error("max iterations exceeded ({0})")]
    MaxIterationsExceeded(usize),

    /// Loop detection tripped: a single node was visited more than
    /// `max_iterations / 2` times.
    #[error("tight loop on {node} ({visits} visits)")]
    TightLoop { node: String, visits: usize },

    /// The interpreter queue drained without ever reaching an end node.
    #[error("did not reach an end node")]
    NoEndNodeReached,

    /// Serialization/deserialization of a message or event failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller's context was canceled mid-run.
    #[error("canceled")]
    Canceled,

    /// Catch-all for node-local errors that don't fit the above.
    #[error("{0}")]
    Custom(String),
}

impl GraphError {
    pub fn node_failed(
        node: impl Into<String>,
        iteration: usize,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        GraphError::NodeFailed {
            node: node.into(),
            iteration,
            source: Box::new(source),
        }
    }
}
