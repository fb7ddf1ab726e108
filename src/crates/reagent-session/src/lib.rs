//! Per-`(app, user, session)` ordered event log with three-scope state
//! (app/user/session), as consumed by the ReAct engine for history and
//! context.

pub mod error;
pub mod key;
pub mod options;
pub mod persistence;
pub mod session;
pub mod service;
pub mod state;

pub use error::{Result, SessionError};
pub use key::{SessionKey, UserKey};
pub use options::SessionOptions;
pub use persistence::{persist_best_effort, SessionPersistence};
pub use session::Session;
pub use service::SessionService;
pub use state::{ScopedMap, StateValue};
