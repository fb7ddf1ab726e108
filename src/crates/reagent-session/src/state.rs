//! Three-scope session state: `app:`-prefixed keys are shared by every
//! session of an app, `user:`-prefixed keys by every session of a user
//! within an app, and unprefixed keys are private to one session.
//!
//! Values are stored as byte strings — callers serialize whatever value
//! they need into/out of that slot; the store does not interpret content.

use std::collections::HashMap;

pub const APP_PREFIX: &str = "app:";
pub const USER_PREFIX: &str = "user:";

pub type StateValue = Vec<u8>;

/// A single scope's committed values plus a pending delta.
///
/// `set` writes through to `committed` immediately (so same-scope reads see
/// it right away) and also records the write in `delta`, so a caller that
/// wants "what changed since the last checkpoint" (e.g. an event's
/// `state_delta`) can call [`ScopedMap::take_delta`] without re-diffing the
/// whole map.
#[derive(Debug, Clone, Default)]
pub struct ScopedMap {
    committed: HashMap<String, StateValue>,
    delta: HashMap<String, StateValue>,
}

impl ScopedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_initial(initial: HashMap<String, StateValue>) -> Self {
        Self { committed: initial, delta: HashMap::new() }
    }

    /// Reads the delta first, falling back to the committed value.
    pub fn get(&self, key: &str) -> Option<&StateValue> {
        self.delta.get(key).or_else(|| self.committed.get(key))
    }

    pub fn set(&mut self, key: impl Into<String>, value: StateValue) {
        let key = key.into();
        self.delta.insert(key.clone(), value.clone());
        self.committed.insert(key, value);
    }

    pub fn take_delta(&mut self) -> HashMap<String, StateValue> {
        std::mem::take(&mut self.delta)
    }

    pub fn all(&self) -> &HashMap<String, StateValue> {
        &self.committed
    }
}

/// Overlay `app` and `user` scoped state onto `session` scoped state under
/// their reserved prefixes, producing the flat map returned to callers.
pub fn materialize(
    session: &ScopedMap,
    app: &ScopedMap,
    user: &ScopedMap,
) -> HashMap<String, StateValue> {
    let mut merged: HashMap<String, StateValue> = session.all().clone();
    for (k, v) in app.all() {
        merged.insert(format!("{APP_PREFIX}{k}"), v.clone());
    }
    for (k, v) in user.all() {
        merged.insert(format!("{USER_PREFIX}{k}"), v.clone());
    }
    merged
}
