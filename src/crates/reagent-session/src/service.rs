//! The session store: a process-wide structure with one lock per `appName`
//! partition. Read operations take a read lock, writes an exclusive lock;
//! app creation is double-checked so the common "app already exists" path
//! never pays for the write lock.

use crate::error::{Result, SessionError};
use crate::key::{SessionKey, UserKey};
use crate::options::SessionOptions;
use crate::persistence::{persist_best_effort, SessionPersistence};
use crate::session::Session;
use crate::state::{materialize, ScopedMap, StateValue};
use chrono::Utc;
use parking_lot::RwLock;
use reagent_core::Event;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Default)]
struct SessionEntry {
    state: ScopedMap,
    events: Vec<Event>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct UserPartition {
    user_state: ScopedMap,
    sessions: HashMap<String, SessionEntry>,
}

#[derive(Default)]
struct AppPartition {
    app_state: ScopedMap,
    users: HashMap<String, UserPartition>,
}

/// In-memory session store, optionally backed by best-effort persistence.
pub struct SessionService {
    apps: RwLock<HashMap<String, Arc<RwLock<AppPartition>>>>,
    persistence: Option<Arc<dyn SessionPersistence>>,
}

impl Default for SessionService {
    fn default() -> Self {
        Self { apps: RwLock::new(HashMap::new()), persistence: None }
    }
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persistence(persistence: Arc<dyn SessionPersistence>) -> Self {
        Self { apps: RwLock::new(HashMap::new()), persistence: Some(persistence) }
    }

    fn app_partition(&self, app_name: &str) -> Arc<RwLock<AppPartition>> {
        if let Some(partition) = self.apps.read().get(app_name) {
            return partition.clone();
        }
        let mut apps = self.apps.write();
        if let Some(partition) = apps.get(app_name) {
            return partition.clone();
        }
        let partition = Arc::new(RwLock::new(AppPartition::default()));
        apps.insert(app_name.to_string(), partition.clone());
        partition
    }

    pub async fn create(
        &self,
        key: &SessionKey,
        initial_state: HashMap<String, StateValue>,
        opts: SessionOptions,
    ) -> Result<Session> {
        let app = self.app_partition(&key.app_name);
        {
            let mut app = app.write();
            let user = app.users.entry(key.user_id.clone()).or_default();
            let now = Utc::now();
            user.sessions.insert(
                key.session_id.clone(),
                SessionEntry {
                    state: ScopedMap::from_initial(initial_state),
                    events: Vec::new(),
                    created_at: now,
                    updated_at: now,
                },
            );
        }
        debug!(app = %key.app_name, user = %key.user_id, session = %key.session_id, "session created");
        self.get(key, opts).await?.ok_or_else(|| SessionError::NotFound(key.clone()))
    }

    pub async fn get(&self, key: &SessionKey, opts: SessionOptions) -> Result<Option<Session>> {
        let app = self.app_partition(&key.app_name);
        let app = app.read();
        let Some(user) = app.users.get(&key.user_id) else { return Ok(None) };
        let Some(entry) = user.sessions.get(&key.session_id) else { return Ok(None) };

        Ok(Some(materialize_session(key, entry, &app.app_state, &user.user_state, opts)))
    }

    pub async fn list(&self, user_key: &UserKey, opts: SessionOptions) -> Result<Vec<Session>> {
        let app = self.app_partition(&user_key.app_name);
        let app = app.read();
        let Some(user) = app.users.get(&user_key.user_id) else { return Ok(Vec::new()) };

        Ok(user
            .sessions
            .iter()
            .map(|(session_id, entry)| {
                let key = SessionKey {
                    app_name: user_key.app_name.clone(),
                    user_id: user_key.user_id.clone(),
                    session_id: session_id.clone(),
                };
                materialize_session(&key, entry, &app.app_state, &user.user_state, opts)
            })
            .collect())
    }

    pub async fn delete(&self, key: &SessionKey) -> Result<()> {
        let app = self.app_partition(&key.app_name);
        let mut app = app.write();
        if let Some(user) = app.users.get_mut(&key.user_id) {
            user.sessions.remove(&key.session_id);
        }
        Ok(())
    }

    pub async fn append_event(
        &self,
        key: &SessionKey,
        event: Event,
        opts: SessionOptions,
    ) -> Result<Session> {
        let app = self.app_partition(&key.app_name);
        {
            let mut app = app.write();
            let user = app
                .users
                .get_mut(&key.user_id)
                .ok_or_else(|| SessionError::NotFound(key.clone()))?;
            let entry = user
                .sessions
                .get_mut(&key.session_id)
                .ok_or_else(|| SessionError::NotFound(key.clone()))?;

            entry.events.push(event);
            if let Some(cap) = opts.session_event_limit {
                if entry.events.len() > cap {
                    let overflow = entry.events.len() - cap;
                    entry.events.drain(0..overflow);
                }
            }
            entry.updated_at = Utc::now();
        }

        let session = self.get(key, opts).await?.ok_or_else(|| SessionError::NotFound(key.clone()))?;
        if let Some(backend) = &self.persistence {
            persist_best_effort(backend.as_ref(), &session).await;
        }
        Ok(session)
    }

    pub fn set_app_state(&self, app_name: &str, key: impl Into<String>, value: StateValue) {
        let app = self.app_partition(app_name);
        app.write().app_state.set(key, value);
    }

    pub fn set_user_state(&self, user_key: &UserKey, key: impl Into<String>, value: StateValue) {
        let app = self.app_partition(&user_key.app_name);
        let mut app = app.write();
        app.users.entry(user_key.user_id.clone()).or_default().user_state.set(key, value);
    }

    pub fn set_session_state(&self, key: &SessionKey, state_key: impl Into<String>, value: StateValue) -> Result<()> {
        let app = self.app_partition(&key.app_name);
        let mut app = app.write();
        let user = app.users.get_mut(&key.user_id).ok_or_else(|| SessionError::NotFound(key.clone()))?;
        let entry = user.sessions.get_mut(&key.session_id).ok_or_else(|| SessionError::NotFound(key.clone()))?;
        entry.state.set(state_key, value);
        Ok(())
    }
}

fn materialize_session(
    key: &SessionKey,
    entry: &SessionEntry,
    app_state: &ScopedMap,
    user_state: &ScopedMap,
    opts: SessionOptions,
) -> Session {
    let mut events = entry.events.clone();
    if let Some(since) = opts.event_time {
        events.retain(|e| e.created_at >= since);
    }
    if let Some(n) = opts.event_num {
        if events.len() > n {
            let drop = events.len() - n;
            events.drain(0..drop);
        }
    }

    Session {
        id: key.session_id.clone(),
        app_name: key.app_name.clone(),
        user_id: key.user_id.clone(),
        state: materialize(&entry.state, app_state, user_state),
        events,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reagent_core::Event;

    fn key() -> SessionKey {
        SessionKey::new("app1", "user1", "sess1").unwrap()
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let service = SessionService::new();
        service.create(&key(), HashMap::new(), SessionOptions::default()).await.unwrap();
        let session = service.get(&key(), SessionOptions::default()).await.unwrap();
        assert!(session.is_some());
    }

    #[tokio::test]
    async fn get_on_unknown_key_returns_none_not_error() {
        let service = SessionService::new();
        let result = service.get(&key(), SessionOptions::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn append_event_on_unknown_session_is_not_found_error() {
        let service = SessionService::new();
        let result = service.append_event(&key(), Event::system(serde_json::json!({})), SessionOptions::default()).await;
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn session_event_limit_drops_oldest() {
        let service = SessionService::new();
        service.create(&key(), HashMap::new(), SessionOptions::default()).await.unwrap();
        let opts = SessionOptions::default().with_session_event_limit(3);
        for i in 0..5 {
            service
                .append_event(&key(), Event::custom("e", serde_json::json!({ "i": i })), opts)
                .await
                .unwrap();
        }
        let session = service.get(&key(), SessionOptions::default()).await.unwrap().unwrap();
        assert_eq!(session.events.len(), 3);
        assert_eq!(session.events[0].data["i"], 2);
        assert_eq!(session.events[2].data["i"], 4);
    }

    #[tokio::test]
    async fn copy_isolation_mutating_returned_session_does_not_affect_store() {
        let service = SessionService::new();
        service.create(&key(), HashMap::new(), SessionOptions::default()).await.unwrap();
        let mut session = service.get(&key(), SessionOptions::default()).await.unwrap().unwrap();
        session.events.push(Event::system(serde_json::json!({})));
        session.state.insert("k".into(), b"v".to_vec());

        let stored_again = service.get(&key(), SessionOptions::default()).await.unwrap().unwrap();
        assert!(stored_again.events.is_empty());
        assert!(!stored_again.state.contains_key("k"));
    }

    #[tokio::test]
    async fn state_overlay_applies_app_and_user_prefixes() {
        let service = SessionService::new();
        service.create(&key(), HashMap::new(), SessionOptions::default()).await.unwrap();
        service.set_app_state("app1", "shared", b"a".to_vec());
        service.set_user_state(&key().user_key(), "pref", b"u".to_vec());

        let session = service.get(&key(), SessionOptions::default()).await.unwrap().unwrap();
        assert_eq!(session.state.get("app:shared"), Some(&b"a".to_vec()));
        assert_eq!(session.state.get("user:pref"), Some(&b"u".to_vec()));
    }

    #[tokio::test]
    async fn list_returns_all_sessions_for_a_user() {
        let service = SessionService::new();
        service.create(&SessionKey::new("app1", "user1", "s1").unwrap(), HashMap::new(), SessionOptions::default()).await.unwrap();
        service.create(&SessionKey::new("app1", "user1", "s2").unwrap(), HashMap::new(), SessionOptions::default()).await.unwrap();
        let sessions = service.list(&UserKey::new("app1", "user1").unwrap(), SessionOptions::default()).await.unwrap();
        assert_eq!(sessions.len(), 2);
    }
}
