//! Persistence of the signed-in user between runs.
//!
//! The storefront keeps exactly one record across restarts: the serialized
//! current user. It is read at startup, written on login and cleared on
//! logout. Storage is injected through [`SessionStore`] so nothing else in
//! the crate touches the filesystem.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use ecomweb_core::User;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while reading or writing the session record.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Reading or writing the backing file failed.
    #[error("session I/O error: {0}")]
    Io(#[from] io::Error),

    /// The stored record is not a valid user.
    #[error("corrupt session record: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Storage for the current user record.
pub trait SessionStore: Send + Sync {
    /// Load the stored user, `None` if nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns error if the record exists but cannot be read or decoded.
    fn load(&self) -> Result<Option<User>, SessionError>;

    /// Replace the stored user.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be written.
    fn save(&self, user: &User) -> Result<(), SessionError>;

    /// Remove the stored user. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if an existing record cannot be removed.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// FileSessionStore
// =============================================================================

/// Session record kept as a JSON file.
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

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<User>, SessionError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let user = serde_json::from_slice(&bytes)?;
        Ok(Some(user))
    }

    fn save(&self, user: &User) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_vec_pretty(user)?;
        std::fs::write(&self.path, json)?;
        debug!(path = %self.path.display(), user_id = %user.id, "session saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "session cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// MemorySessionStore
// =============================================================================

/// Session record kept in memory; lost when the process exits.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    user: Mutex<Option<User>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `user`.
    #[must_use]
    pub const fn with_user(user: User) -> Self {
        Self {
            user: Mutex::new(Some(user)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<User>, SessionError> {
        Ok(self
            .user
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, user: &User) -> Result<(), SessionError> {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.user.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use ecomweb_core::{Role, UserId};

    use super::*;

    fn user() -> User {
        User {
            id: UserId::new(7),
            username: "asha".to_string(),
            email: "asha@example.com".to_string(),
            full_name: "Asha Rao".to_string(),
            address: String::new(),
            phone_number: String::new(),
            role: Role::User,
        }
    }

    #[test]
    fn test_file_store_missing_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested/session.json"));

        store.save(&user()).unwrap();
        assert_eq!(store.load().unwrap(), Some(user()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"{not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(matches!(store.load(), Err(SessionError::Corrupt(_))));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::new();
        assert!(store.load().unwrap().is_none());

        store.save(&user()).unwrap();
        assert_eq!(store.load().unwrap().map(|u| u.id), Some(UserId::new(7)));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
