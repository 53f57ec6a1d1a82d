//! Durable session state.
//!
//! The session (bearer token, username, wallet balance) survives process
//! restarts through a [`SessionStore`]. Callers never reach for it globally:
//! a [`SessionContext`] is created with [`SessionContext::init`], passed to
//! every authenticated operation, and cleared with
//! [`SessionContext::teardown`] on logout.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use qkart_core::Price;

/// Errors that can occur when loading or persisting the session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// An operation needs a logged-in user.
    #[error("{0}")]
    NotLoggedIn(&'static str),

    /// Reading or writing the session file failed.
    #[error("Session storage error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session file is not valid JSON.
    #[error("Corrupt session file at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The in-memory store's lock was poisoned.
    #[error("Session store lock poisoned")]
    Poisoned,
}

/// A logged-in user's session.
///
/// `Debug` output redacts the token.
#[derive(Debug, Clone)]
pub struct Session {
    /// Bearer token for authenticated calls.
    pub token: SecretString,
    /// Username of the logged-in user.
    pub username: String,
    /// Locally cached wallet balance.
    pub balance: Price,
    /// When the session was last written.
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Create a session stamped with the current time.
    #[must_use]
    pub fn new(token: SecretString, username: impl Into<String>, balance: Price) -> Self {
        Self {
            token,
            username: username.into(),
            balance,
            updated_at: Utc::now(),
        }
    }
}

/// On-disk form of a session, keyed `token` / `username` / `balance`.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    username: String,
    balance: Price,
    updated_at: DateTime<Utc>,
}

impl From<&Session> for StoredSession {
    fn from(session: &Session) -> Self {
        Self {
            token: session.token.expose_secret().to_owned(),
            username: session.username.clone(),
            balance: session.balance,
            updated_at: session.updated_at,
        }
    }
}

impl From<StoredSession> for Session {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: SecretString::from(stored.token),
            username: stored.username,
            balance: stored.balance,
            updated_at: stored.updated_at,
        }
    }
}

/// Durable storage for the session.
pub trait SessionStore: Send + Sync {
    /// Load the persisted session, if any.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be read.
    fn load(&self) -> Result<Option<Session>, SessionError>;

    /// Persist a session, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be written.
    fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the persisted session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the storage cannot be cleared.
    fn clear(&self) -> Result<(), SessionError>;
}

/// Session stored as a JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store backed by `path`. The file is created on first save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let stored: StoredSession =
            serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(&StoredSession::from(session)).map_err(|source| {
            SessionError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Session kept in memory only. Used by tests and throwaway runs.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.session.lock().map_err(|_| SessionError::Poisoned)?.clone())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.session.lock().map_err(|_| SessionError::Poisoned)? = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.session.lock().map_err(|_| SessionError::Poisoned)? = None;
        Ok(())
    }
}

/// The session in use by the current process, backed by a durable store.
pub struct SessionContext {
    store: Box<dyn SessionStore>,
    session: Option<Session>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Load any persisted session from `store`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be read.
    pub fn init(store: impl SessionStore + 'static) -> Result<Self, SessionError> {
        let session = store.load()?;
        if let Some(session) = &session {
            tracing::debug!(username = %session.username, "Restored session");
        }
        Ok(Self {
            store: Box::new(store),
            session,
        })
    }

    /// The current session, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Whether a user is logged in.
    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Bearer token of the current session.
    #[must_use]
    pub fn token(&self) -> Option<&SecretString> {
        self.session.as_ref().map(|s| &s.token)
    }

    /// The current session, or `NotLoggedIn` carrying `reason`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoggedIn` if there is no session.
    pub fn require(&self, reason: &'static str) -> Result<&Session, SessionError> {
        self.session.as_ref().ok_or(SessionError::NotLoggedIn(reason))
    }

    /// Persist a freshly created session (login).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be written.
    pub fn establish(&mut self, session: Session) -> Result<&Session, SessionError> {
        self.store.save(&session)?;
        Ok(self.session.insert(session))
    }

    /// Replace the cached wallet balance and persist it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotLoggedIn` without a session, or a storage
    /// error if the store cannot be written.
    pub fn set_balance(&mut self, balance: Price) -> Result<(), SessionError> {
        let mut updated = self
            .session
            .clone()
            .ok_or(SessionError::NotLoggedIn("No active session"))?;
        updated.balance = balance;
        updated.updated_at = Utc::now();
        self.store.save(&updated)?;
        self.session = Some(updated);
        Ok(())
    }

    /// Clear the session from memory and storage (logout).
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the store cannot be cleared.
    pub fn teardown(&mut self) -> Result<(), SessionError> {
        self.store.clear()?;
        if let Some(session) = self.session.take() {
            tracing::debug!(username = %session.username, "Session cleared");
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(SecretString::from("token-123"), "crio.do", Price::from_units(5000))
    }

    #[test]
    fn test_file_store_round_trip_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&session()).unwrap();
        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.username, "crio.do");
        assert_eq!(loaded.balance, Price::from_units(5000));
        assert_eq!(loaded.token.expose_secret(), "token-123");

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_uses_storage_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileSessionStore::new(&path).save(&session()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["token"], "token-123");
        assert_eq!(raw["username"], "crio.do");
        assert!(raw["balance"].is_number());
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let err = FileSessionStore::new(&path).load().unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));
    }

    #[test]
    fn test_session_debug_redacts_token() {
        let debug_output = format!("{:?}", session());
        assert!(debug_output.contains("crio.do"));
        assert!(!debug_output.contains("token-123"));
    }

    #[test]
    fn test_context_lifecycle() {
        let mut context = SessionContext::init(MemorySessionStore::default()).unwrap();
        assert!(!context.is_logged_in());
        assert!(matches!(
            context.require("Login first"),
            Err(SessionError::NotLoggedIn("Login first"))
        ));

        context.establish(session()).unwrap();
        assert_eq!(context.token().unwrap().expose_secret(), "token-123");

        context.set_balance(Price::from_units(4900)).unwrap();
        assert_eq!(context.session().unwrap().balance, Price::from_units(4900));

        context.teardown().unwrap();
        assert!(context.session().is_none());
        assert!(context.set_balance(Price::ZERO).is_err());
    }

    /// Accepts the first save, refuses every later one.
    #[derive(Debug, Default)]
    struct FlakyStore {
        saves: Mutex<u32>,
    }

    impl SessionStore for FlakyStore {
        fn load(&self) -> Result<Option<Session>, SessionError> {
            Ok(None)
        }

        fn save(&self, _session: &Session) -> Result<(), SessionError> {
            let mut saves = self.saves.lock().map_err(|_| SessionError::Poisoned)?;
            *saves += 1;
            if *saves > 1 {
                return Err(SessionError::Poisoned);
            }
            Ok(())
        }

        fn clear(&self) -> Result<(), SessionError> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_balance_save_keeps_previous_balance() {
        let mut context = SessionContext::init(FlakyStore::default()).unwrap();
        context.establish(session()).unwrap();

        assert!(context.set_balance(Price::from_units(4800)).is_err());
        assert_eq!(context.session().unwrap().balance, Price::from_units(5000));
    }

    #[test]
    fn test_context_restores_persisted_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut first = SessionContext::init(FileSessionStore::new(&path)).unwrap();
        first.establish(session()).unwrap();
        first.set_balance(Price::from_units(1200)).unwrap();

        let second = SessionContext::init(FileSessionStore::new(&path)).unwrap();
        assert_eq!(second.session().unwrap().balance, Price::from_units(1200));
    }
}
