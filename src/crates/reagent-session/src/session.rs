//! The materialized [`Session`] value returned across the store boundary.

use crate::state::StateValue;
use chrono::{DateTime, Utc};
use reagent_core::Event;
use std::collections::HashMap;

/// A session as handed back to a caller: a copy. Events are a shallow-cloned
/// list, state is the flattened app/user/session overlay. Mutating this
/// value never affects what is stored.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub app_name: String,
    pub user_id: String,
    pub state: HashMap<String, StateValue>,
    pub events: Vec<Event>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
