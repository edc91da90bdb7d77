//! Session store: the persisted credential that survives restarts.
//!
//! SYSTEM CONTEXT
//! ==============
//! Two keys, `access_token` and `user` (JSON profile), live in a
//! `KeyValueStorage`. They are always written and removed as a pair. The
//! HTTP gateway only ever sees the token, through `TokenSource`.
//!
//! TRADE-OFFS
//! ==========
//! `FileStorage` re-reads the file on every access instead of caching, so a
//! logout in one process is visible to the next call made by another.

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::net::client::TokenSource;
use crate::net::types::{Credential, UserProfile};

pub const TOKEN_KEY: &str = "access_token";
pub const USER_KEY: &str = "user";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage is corrupt: {0}")]
    Corrupt(String),
    #[error("could not encode session data: {0}")]
    Encode(String),
}

// =============================================================================
// STORAGE BACKENDS
// =============================================================================

/// Process-local string key/value storage.
pub trait KeyValueStorage: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write every pair in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError>;

    /// Remove every key in one step. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing medium cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError>;
}

/// In-memory storage; gone when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in pairs {
            entries.insert((*key).to_owned(), (*value).to_owned());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON object on disk, replaced atomically (write temp file, then rename).
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries).map_err(|e| StoreError::Encode(e.to_string()))?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Corrupt files are treated as empty on write so a fresh login can recover.
    fn read_for_update(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match self.read_all() {
            Err(StoreError::Corrupt(reason)) => {
                tracing::warn!(%reason, "discarding corrupt session file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set_many(&self, pairs: &[(&str, &str)]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_for_update()?;
        for (key, value) in pairs {
            entries.insert((*key).to_owned(), (*value).to_owned());
        }
        self.write_all(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.read_for_update()?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.write_all(&entries)
    }
}

// =============================================================================
// SESSION STORE
// =============================================================================

/// Typed view over the two persisted session keys.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn token(&self) -> Result<Option<String>, StoreError> {
        Ok(self.storage.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// The stored credential, if both halves are present and the profile
    /// decodes. A half-written or unreadable pair counts as no credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn load(&self) -> Result<Option<Credential>, StoreError> {
        let token = self.token()?;
        let user = self.storage.get(USER_KEY)?;
        let (Some(token), Some(raw_user)) = (token, user) else {
            return Ok(None);
        };
        match serde_json::from_str::<UserProfile>(&raw_user) {
            Ok(user) => Ok(Some(Credential { token, user })),
            Err(e) => {
                tracing::warn!(error = %e, "stored profile does not decode; ignoring stored session");
                Ok(None)
            }
        }
    }

    /// Write token and profile together.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be encoded or storage fails.
    pub fn persist(&self, credential: &Credential) -> Result<(), StoreError> {
        let user = serde_json::to_string(&credential.user).map_err(|e| StoreError::Encode(e.to_string()))?;
        self.storage
            .set_many(&[(TOKEN_KEY, credential.token.as_str()), (USER_KEY, user.as_str())])
    }

    /// Replace the cached profile, but only while a token is stored; a
    /// profile never lands on disk without its token.
    ///
    /// Returns whether the profile was written.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be encoded or storage fails.
    pub fn refresh_profile(&self, user: &UserProfile) -> Result<bool, StoreError> {
        let Some(token) = self.token()? else {
            return Ok(false);
        };
        self.persist(&Credential { token, user: user.clone() })?;
        Ok(true)
    }

    /// Remove token and profile together.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.storage.remove_many(&[TOKEN_KEY, USER_KEY])
    }
}

impl TokenSource for SessionStore {
    fn bearer_token(&self) -> Option<String> {
        match self.token() {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored token; sending request without one");
                None
            }
        }
    }
}
