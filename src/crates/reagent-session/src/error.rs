//! Error types for session store operations.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("appName is required")]
    KeyAppRequired,

    #[error("userID is required")]
    KeyUserRequired,

    #[error("sessionID is required")]
    KeySessionRequired,

    #[error("no session for {0:?}")]
    NotFound(crate::key::SessionKey),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
