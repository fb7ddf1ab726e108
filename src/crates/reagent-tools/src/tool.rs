//! The `Tool` contract: a named, parameter-validated, side-effectful
//! function returning a serializable result.

use crate::definition::ToolDefinition;
use crate::error::Result;
use async_trait::async_trait;
use reagent_core::RunContext;
use serde_json::Value;
use std::collections::HashMap;

/// Arguments passed to `execute`, keyed by parameter name.
pub type ToolArgs = HashMap<String, Value>;

/// A tool's result. `output` is typically a string but may be any
/// serializable value.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: Value,
}

impl ToolResult {
    pub fn new(output: impl Into<Value>) -> Self {
        Self { output: output.into() }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON-Schema-shaped parameter map.
    fn parameters(&self) -> Value;

    fn get_definition(&self) -> ToolDefinition;

    async fn execute(&self, ctx: &RunContext, args: ToolArgs) -> Result<ToolResult>;
}
