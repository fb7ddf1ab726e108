//! State machine with two states: Idle (no active cycle) and Active
//! (exactly one open cycle). All operations are guarded by a single mutex;
//! `GetHistory`/`CurrentCycle` take a read lock.

use crate::error::{PrebuiltError, Result};
use crate::types::{Action, Cycle, CycleObservation, Thought};
use chrono::Utc;
use parking_lot::RwLock;
use reagent_checkpoint::{persist_best_effort, CheckpointStore, StoredCycle};
use std::sync::Arc;
use tracing::warn;

#[derive(Default)]
struct Inner {
    active: Option<Cycle>,
    history: Vec<Cycle>,
}

pub struct CycleManager {
    inner: RwLock<Inner>,
    persistence: Option<Arc<dyn CheckpointStore>>,
}

impl Default for CycleManager {
    fn default() -> Self {
        Self { inner: RwLock::new(Inner::default()), persistence: None }
    }
}

impl CycleManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persistence(persistence: Arc<dyn CheckpointStore>) -> Self {
        Self { inner: RwLock::new(Inner::default()), persistence: Some(persistence) }
    }

    pub fn start_cycle(&self, thought: Thought) -> Result<()> {
        let mut inner = self.inner.write();
        if inner.active.is_some() {
            return Err(PrebuiltError::CycleAlreadyActive);
        }
        inner.active = Some(Cycle::new(thought));
        Ok(())
    }

    pub fn record_actions(&self, actions: Vec<Action>) -> Result<()> {
        let mut inner = self.inner.write();
        let cycle = inner.active.as_mut().ok_or(PrebuiltError::NoActiveCycle)?;
        cycle.actions.extend(actions);
        Ok(())
    }

    pub fn record_observations(&self, observations: Vec<CycleObservation>) -> Result<()> {
        let mut inner = self.inner.write();
        let cycle = inner.active.as_mut().ok_or(PrebuiltError::NoActiveCycle)?;
        cycle.observations.extend(observations);
        Ok(())
    }

    /// Ends the active cycle, appends a copy to history, and attempts a
    /// best-effort persist. Returns a deep copy of the ended cycle.
    pub async fn end_cycle(&self) -> Result<Cycle> {
        let cycle = {
            let mut inner = self.inner.write();
            let mut cycle = inner.active.take().ok_or(PrebuiltError::NoActiveCycle)?;
            cycle.end_time = Some(Utc::now());
            inner.history.push(cycle.clone());
            cycle
        };

        if let Some(store) = &self.persistence {
            let json = serde_json::to_value(&cycle).map_err(PrebuiltError::Serialization)?;
            persist_best_effort(store.as_ref(), StoredCycle { id: cycle.id.clone(), json }).await;
        }

        Ok(cycle)
    }

    /// Completed cycles, merged with persisted-but-not-in-memory cycles by
    /// ID (in-memory wins on collision).
    pub async fn get_history(&self) -> Vec<Cycle> {
        let mut history = self.inner.read().history.clone();

        if let Some(store) = &self.persistence {
            match store.list_all().await {
                Ok(stored) => {
                    let known: std::collections::HashSet<String> =
                        history.iter().map(|c| c.id.clone()).collect();
                    for entry in stored {
                        if known.contains(&entry.id) {
                            continue;
                        }
                        match serde_json::from_value::<Cycle>(entry.json) {
                            Ok(cycle) => history.push(cycle),
                            Err(e) => warn!(error = %e, "failed to deserialize persisted cycle"),
                        }
                    }
                }
                Err(e) => warn!(error = %e, "failed to list persisted cycles"),
            }
        }

        history
    }

    pub fn current_cycle(&self) -> Option<Cycle> {
        self.inner.read().active.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Thought;

    #[test]
    fn rejects_start_while_active() {
        let manager = CycleManager::new();
        manager.start_cycle(Thought::new("t1")).unwrap();
        let result = manager.start_cycle(Thought::new("t2"));
        assert!(matches!(result, Err(PrebuiltError::CycleAlreadyActive)));
    }

    #[test]
    fn rejects_operations_while_idle() {
        let manager = CycleManager::new();
        assert!(matches!(manager.record_actions(vec![]), Err(PrebuiltError::NoActiveCycle)));
    }

    #[tokio::test]
    async fn end_cycle_moves_active_to_history() {
        let manager = CycleManager::new();
        manager.start_cycle(Thought::new("t1")).unwrap();
        assert!(manager.current_cycle().is_some());
        manager.end_cycle().await.unwrap();
        assert!(manager.current_cycle().is_none());
        assert_eq!(manager.get_history().await.len(), 1);
    }

    #[tokio::test]
    async fn history_merges_persisted_cycles_by_id_in_memory_wins() {
        let store: Arc<dyn CheckpointStore> = Arc::new(reagent_checkpoint::InMemoryCheckpointStore::new());
        let manager = CycleManager::with_persistence(store.clone());
        manager.start_cycle(Thought::new("t1")).unwrap();
        let cycle = manager.end_cycle().await.unwrap();

        // Simulate an out-of-band persisted cycle not in this manager's memory.
        store
            .put(StoredCycle {
                id: "external".into(),
                json: serde_json::to_value(&Cycle::new(Thought::new("external"))).unwrap(),
            })
            .await
            .unwrap();

        let history = manager.get_history().await;
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|c| c.id == cycle.id));
        assert!(history.iter().any(|c| c.id == "external"));
    }
}
