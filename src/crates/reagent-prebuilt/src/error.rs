//! Errors that can occur in the Cycle Manager and ReAct Engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrebuiltError>;

#[derive(Error, Debug)]
pub enum PrebuiltError {
    #[error("cannot start a new cycle while another is in progress")]
    CycleAlreadyActive,

    #[error("no active cycle")]
    NoActiveCycle,

    #[error("thought generation failed: {0}")]
    ThoughtGeneration(String),

    #[error("action selection failed: {0}")]
    ActionSelection(String),

    #[error("response generation failed: {0}")]
    ResponseGeneration(String),

    #[error("canceled")]
    Canceled,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("tool error: {0}")]
    Tool(#[from] reagent_tools::ToolError),

    #[error("graph error: {0}")]
    Graph(#[from] reagent_core::GraphError),
}
