//! Cycle Manager and ReAct Engine: the thought/action/observation loop that
//! drives a single conversational turn to completion, plus the handful of
//! graph-composition helpers ([`reagent_core::composition`]) that the engine
//! itself is built out of.

pub mod collaborators;
pub mod cycle_manager;
pub mod engine;
pub mod error;
pub mod model_adapter;
pub mod types;

pub use collaborators::{ActionSelector, ResponseGenerator, StreamingThoughtGenerator, ThoughtGenerator, ThoughtPartial};
pub use cycle_manager::CycleManager;
pub use engine::{ReActEngine, ReActEngineBuilder};
pub use error::{PrebuiltError, Result};
pub use model_adapter::{ModelResponseGenerator, ModelThoughtGenerator, PassthroughActionSelector};
pub use types::{
    contains_final_answer_marker, extract_final_answer, Action, Cycle, CycleObservation, PlanState, SuggestedAction,
    Thought, FINAL_ANSWER_MARKERS,
};
