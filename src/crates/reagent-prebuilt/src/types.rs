//! Data model for one pass of the ReAct loop: thought, the actions it
//! suggested, and the observations those actions produced.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Opaque to this crate beyond its four fields — the engine only reads it
/// to expose to prompting strategies.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct PlanState {
    pub has_plan: bool,
    pub current_plan: Vec<String>,
    pub current_step_index: usize,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Thought {
    pub id: String,
    pub content: String,
    pub r#type: Option<String>,
    pub suggested_actions: Option<Vec<SuggestedAction>>,
    pub plan_state: Option<PlanState>,
    pub ts: DateTime<Utc>,
}

/// An action the thought generator proposed, before it is committed to the
/// cycle (which assigns `thought_id` and an `id`) via [`Action`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SuggestedAction {
    pub tool_name: String,
    pub tool_input: HashMap<String, Value>,
}

impl Thought {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            r#type: None,
            suggested_actions: None,
            plan_state: None,
            ts: Utc::now(),
        }
    }

    pub fn with_suggested_actions(mut self, actions: Vec<SuggestedAction>) -> Self {
        self.suggested_actions = Some(actions);
        self
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Action {
    pub id: String,
    pub thought_id: String,
    pub tool_name: String,
    pub tool_input: HashMap<String, Value>,
    pub ts: DateTime<Utc>,
}

impl Action {
    pub fn new(thought_id: impl Into<String>, tool_name: impl Into<String>, tool_input: HashMap<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought_id: thought_id.into(),
            tool_name: tool_name.into(),
            tool_input,
            ts: Utc::now(),
        }
    }
}

/// Exactly one of `output`/`error` is populated (mapping keys `"output"`
/// and `"error"` on the raw `tool_output` side — `is_error` selects which).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CycleObservation {
    pub id: String,
    pub action_id: String,
    pub tool_output: HashMap<String, Value>,
    pub is_error: bool,
    pub ts: DateTime<Utc>,
}

impl CycleObservation {
    pub fn success(action_id: impl Into<String>, output: Value) -> Self {
        let mut tool_output = HashMap::new();
        tool_output.insert("output".to_string(), output);
        Self { id: Uuid::new_v4().to_string(), action_id: action_id.into(), tool_output, is_error: false, ts: Utc::now() }
    }

    pub fn error(action_id: impl Into<String>, message: impl Into<String>) -> Self {
        let mut tool_output = HashMap::new();
        tool_output.insert("error".to_string(), Value::String(message.into()));
        Self { id: Uuid::new_v4().to_string(), action_id: action_id.into(), tool_output, is_error: true, ts: Utc::now() }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Cycle {
    pub id: String,
    pub thought: Thought,
    pub actions: Vec<Action>,
    pub observations: Vec<CycleObservation>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Cycle {
    pub fn new(thought: Thought) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            thought,
            actions: Vec::new(),
            observations: Vec::new(),
            start_time: Utc::now(),
            end_time: None,
        }
    }

    /// Case-insensitive scan for one of the fixed final-answer markers.
    pub fn thought_contains_final_answer(&self) -> bool {
        contains_final_answer_marker(&self.thought.content)
    }
}

pub const FINAL_ANSWER_MARKERS: &[&str] = &[
    "final answer:",
    "my final answer is",
    "in conclusion,",
    "to summarize,",
    "i've completed my analysis",
    "the answer is",
];

pub fn contains_final_answer_marker(content: &str) -> bool {
    let lower = content.to_lowercase();
    FINAL_ANSWER_MARKERS.iter().any(|m| lower.contains(m))
}

/// Extract the final-answer text from thought content: text after the first
/// marker (trimmed); else the last paragraph split on blank-line
/// boundaries; else the whole content.
pub fn extract_final_answer(content: &str) -> String {
    let lower = content.to_lowercase();
    for marker in FINAL_ANSWER_MARKERS {
        if let Some(idx) = lower.find(marker) {
            let after = &content[idx + marker.len()..];
            let trimmed = after.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    if let Some(last) = content.split("\n\n").filter(|p| !p.trim().is_empty()).last() {
        return last.trim().to_string();
    }
    content.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_after_marker() {
        let text = extract_final_answer("Final answer: hello");
        assert_eq!(text, "hello");
    }

    #[test]
    fn falls_back_to_last_paragraph() {
        let text = extract_final_answer("first paragraph\n\nsecond paragraph");
        assert_eq!(text, "second paragraph");
    }

    #[test]
    fn falls_back_to_whole_content() {
        let text = extract_final_answer("just one line");
        assert_eq!(text, "just one line");
    }

    #[test]
    fn detects_markers_case_insensitively() {
        assert!(contains_final_answer_marker("THE ANSWER IS 42"));
        assert!(!contains_final_answer_marker("I should compute more"));
    }
}
