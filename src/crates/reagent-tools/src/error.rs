//! Error types for tool dispatch and validation.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ToolError>;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("tool {0} not found")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("schema validation failed: {0}")]
    SchemaInvalid(String),

    #[error("tool execution failed: {0}")]
    Execution(String),
}
