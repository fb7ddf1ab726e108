//! A scripted [`Model`] for unit and integration tests elsewhere in the
//! workspace.

use crate::error::Result;
use crate::model::{GenerateOptions, GenerateResponse, Model};
use async_trait::async_trait;
use reagent_core::Message;
use parking_lot::Mutex;

/// Replays a fixed sequence of responses, one per call, repeating the last
/// one once exhausted.
pub struct ScriptedModel {
    responses: Mutex<Vec<GenerateResponse>>,
    cursor: Mutex<usize>,
}

impl ScriptedModel {
    pub fn new(responses: Vec<GenerateResponse>) -> Self {
        Self { responses: Mutex::new(responses), cursor: Mutex::new(0) }
    }
}

#[async_trait]
impl Model for ScriptedModel {
    async fn generate_with_messages(
        &self,
        _messages: &[Message],
        _options: &GenerateOptions,
    ) -> Result<GenerateResponse> {
        let responses = self.responses.lock();
        let mut cursor = self.cursor.lock();
        let idx = (*cursor).min(responses.len().saturating_sub(1));
        *cursor += 1;
        Ok(responses[idx].clone())
    }
}
