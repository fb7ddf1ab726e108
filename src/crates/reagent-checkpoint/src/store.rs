//! Cycle persistence. A backend only has to support `put` and `list_all`;
//! the in-memory cycle manager (in `reagent-prebuilt`) is always
//! authoritative for the active run, so a store only needs to survive long
//! enough to be read back on `GetHistory`, merged by ID.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::warn;

/// A completed cycle serialized as a JSON document, addressed by cycle ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredCycle {
    pub id: String,
    pub json: serde_json::Value,
}

/// A best-effort backend for persisted cycles. No consistency level is
/// required of implementations — callers are expected to swallow and log
/// failures rather than propagate them.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn put(&self, cycle: StoredCycle) -> Result<()>;
    async fn list_all(&self) -> Result<Vec<StoredCycle>>;
}

/// Reference implementation: all cycles held in memory behind a single
/// `RwLock`. Data does not survive process restart.
#[derive(Debug, Default)]
pub struct InMemoryCheckpointStore {
    cycles: RwLock<HashMap<String, StoredCycle>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn put(&self, cycle: StoredCycle) -> Result<()> {
        self.cycles.write().await.insert(cycle.id.clone(), cycle);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StoredCycle>> {
        Ok(self.cycles.read().await.values().cloned().collect())
    }
}

/// Call `store.put(cycle)`, logging and swallowing any failure rather than
/// propagating it — persistence is best-effort and must never fail the
/// in-memory path.
pub async fn persist_best_effort(store: &dyn CheckpointStore, cycle: StoredCycle) {
    let id = cycle.id.clone();
    if let Err(e) = store.put(cycle).await {
        warn!(cycle_id = %id, error = %e, "cycle persistence failed, continuing in-memory only");
    }
}
