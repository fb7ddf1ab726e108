//! Optional, best-effort persistence backend for the Cycle Manager.
//!
//! Each cycle is stored as a single JSON document addressed by its ID,
//! written through [`store::CheckpointStore`].

pub mod error;
pub mod store;

pub use error::{CheckpointError, Result};
pub use store::{persist_best_effort, CheckpointStore, InMemoryCheckpointStore, StoredCycle};
