//! The Model capability contract. Concrete providers are deliberately out
//! of scope — this crate only defines what the engine is allowed to assume
//! about a language model.

pub mod error;
pub mod mock;
pub mod model;

pub use error::{LlmError, Result};
pub use mock::ScriptedModel;
pub use model::{
    FinishReason, FunctionCall, GenerateChunk, GenerateOptions, GenerateResponse, Model, ToolCall,
};
