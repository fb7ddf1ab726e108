//! The typed tool descriptor returned by [`crate::Tool::get_definition`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One property of a tool's parameter schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub type_: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#enum: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl PropertySchema {
    pub fn new(type_: impl Into<String>, description: impl Into<String>) -> Self {
        Self { type_: type_.into(), description: description.into(), r#enum: None, default: None }
    }

    pub fn with_enum(mut self, values: Vec<Value>) -> Self {
        self.r#enum = Some(values);
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Typed tool descriptor, distinct from [`crate::Tool::parameters`]'s raw
/// JSON-Schema-shaped map — this is the structured form model providers
/// typically want for function-calling declarations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub properties: HashMap<String, PropertySchema>,
    pub required: Vec<String>,
}
