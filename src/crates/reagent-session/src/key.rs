//! Session and user keys. Keys are case-sensitive; no normalization happens
//! anywhere in this crate.

use crate::error::{Result, SessionError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserKey {
    pub app_name: String,
    pub user_id: String,
}

impl UserKey {
    pub fn new(app_name: impl Into<String>, user_id: impl Into<String>) -> Result<Self> {
        let app_name = app_name.into();
        let user_id = user_id.into();
        if app_name.is_empty() {
            return Err(SessionError::KeyAppRequired);
        }
        if user_id.is_empty() {
            return Err(SessionError::KeyUserRequired);
        }
        Ok(Self { app_name, user_id })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Result<Self> {
        let user_key = UserKey::new(app_name, user_id)?;
        let session_id = session_id.into();
        if session_id.is_empty() {
            return Err(SessionError::KeySessionRequired);
        }
        Ok(Self {
            app_name: user_key.app_name,
            user_id: user_key.user_id,
            session_id,
        })
    }

    pub fn user_key(&self) -> UserKey {
        UserKey { app_name: self.app_name.clone(), user_id: self.user_id.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_app_name() {
        assert!(matches!(SessionKey::new("", "u", "s"), Err(SessionError::KeyAppRequired)));
    }

    #[test]
    fn rejects_empty_user_id() {
        assert!(matches!(SessionKey::new("a", "", "s"), Err(SessionError::KeyUserRequired)));
    }

    #[test]
    fn rejects_empty_session_id() {
        assert!(matches!(SessionKey::new("a", "u", ""), Err(SessionError::KeySessionRequired)));
    }
}
