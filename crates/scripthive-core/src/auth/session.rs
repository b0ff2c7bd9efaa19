use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::storage::{KeyValueStorage, StorageError};

/// Storage key holding the serialized session.
pub const SESSION_KEY: &str = "user";

/// The authenticated principal, as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: i64,
    pub full_name: String,
    pub user_name: String,
}

impl Session {
    /// A session is only usable when every field is populated.
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty()
            && !self.full_name.trim().is_empty()
            && !self.user_name.trim().is_empty()
    }

    /// Name to greet the user with.
    pub fn display_name(&self) -> &str {
        if self.full_name.trim().is_empty() {
            "Admin"
        } else {
            &self.full_name
        }
    }
}

/// Persists the session in a key-value storage area.
///
/// `load` never fails: anything unreadable is treated as logged out and the
/// stored value is purged.
pub struct SessionStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> SessionStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read the persisted session, if a valid one exists.
    pub fn load(&self) -> Option<Session> {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No stored session");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored session");
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) if session.is_complete() => {
                debug!(user_id = session.user_id, "Stored session loaded");
                Some(session)
            }
            Ok(_) => {
                warn!("Stored session is incomplete, discarding");
                self.purge();
                None
            }
            Err(e) => {
                warn!(error = %e, "Stored session is malformed, discarding");
                self.purge();
                None
            }
        }
    }

    /// Persist a complete session.
    pub fn save(&self, session: &Session) -> Result<(), StorageError> {
        if !session.is_complete() {
            return Err(StorageError::IncompleteSession);
        }
        let contents = serde_json::to_string(session)?;
        self.storage.set(SESSION_KEY, &contents)
    }

    /// Remove the persisted session.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(SESSION_KEY)
    }

    fn purge(&self) {
        if let Err(e) = self.storage.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to purge stored session");
        }
    }
}
