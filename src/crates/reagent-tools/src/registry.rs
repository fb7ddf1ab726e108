//! A lookup table of tools by name, with the "tool not found" failure
//! contract the ReAct engine's dispatch relies on (record an error
//! observation rather than fail the cycle).

use crate::definition::ToolDefinition;
use crate::error::{Result, ToolError};
use crate::tool::{Tool, ToolArgs, ToolResult};
use crate::validation::validate_args;
use reagent_core::RunContext;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn list_tools(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    pub fn list_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.get_definition()).collect()
    }

    /// Look up `name`; if present, validate `args` against its schema and
    /// execute. Returns [`ToolError::NotFound`] for a missing tool — callers
    /// in `reagent-prebuilt` turn that into an error observation rather than
    /// failing the whole cycle.
    pub async fn execute(&self, ctx: &RunContext, name: &str, args: ToolArgs) -> Result<ToolResult> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        validate_args(&tool.parameters(), &args)?;
        debug!(tool = name, "dispatching tool");
        tool.execute(ctx, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        fn parameters(&self) -> serde_json::Value {
            serde_json::json!({ "type": "object", "properties": { "text": { "type": "string" } }, "required": ["text"] })
        }
        fn get_definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".into(),
                description: "echoes its input".into(),
                properties: HashMap::new(),
                required: vec!["text".into()],
            }
        }
        async fn execute(&self, _ctx: &RunContext, args: ToolArgs) -> Result<ToolResult> {
            Ok(ToolResult::new(args.get("text").cloned().unwrap_or_default()))
        }
    }

    #[tokio::test]
    async fn missing_tool_is_not_found() {
        let registry = ToolRegistry::new();
        let result = registry.execute(&RunContext::new(), "nope", Default::default()).await;
        assert!(matches!(result, Err(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn registered_tool_executes() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let mut args = ToolArgs::new();
        args.insert("text".into(), serde_json::json!("hi"));
        let result = registry.execute(&RunContext::new(), "echo", args).await.unwrap();
        assert_eq!(result.output, serde_json::json!("hi"));
    }

    #[tokio::test]
    async fn invalid_args_are_rejected_before_execute() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));
        let result = registry.execute(&RunContext::new(), "echo", Default::default()).await;
        assert!(matches!(result, Err(ToolError::InvalidInput(_))));
    }
}
