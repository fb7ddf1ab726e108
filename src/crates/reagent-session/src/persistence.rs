//! Optional best-effort persistence hook. Never consulted on the read path;
//! failures are logged and swallowed, exactly as for cycle persistence in
//! `reagent-checkpoint`.

use crate::session::Session;
use async_trait::async_trait;
use tracing::warn;

#[async_trait]
pub trait SessionPersistence: Send + Sync {
    async fn persist(&self, session: &Session) -> Result<(), String>;
}

pub async fn persist_best_effort(backend: &dyn SessionPersistence, session: &Session) {
    if let Err(e) = backend.persist(session).await {
        warn!(session_id = %session.id, error = %e, "session persistence failed, continuing in-memory only");
    }
}
