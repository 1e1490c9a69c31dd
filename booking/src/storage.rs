//! Local key-value persistence.
//!
//! Holds the session (`token`, `user`) and the `selectedBus` snapshot so a
//! restarted client can pick up where it left off.

use crate::error::StorageError;
use crate::types::{BusListing, Session, User};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Key holding the bearer token
pub const TOKEN_KEY: &str = "token";
/// Key holding the signed-in user as JSON
pub const USER_KEY: &str = "user";
/// Key holding the last selected bus as JSON
pub const SELECTED_BUS_KEY: &str = "selectedBus";

/// String key-value store
pub trait KeyValueStorage: Send + Sync {
    /// Read a value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a value; deleting a missing key is not an error
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Write several values as one unit
    ///
    /// If any write fails, keys already written by this call are removed again.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError`] hit while writing.
    fn set_all(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(error) = self.set(key, value) {
                for (key, _) in &entries[..written] {
                    if let Err(error) = self.remove(key) {
                        tracing::warn!(%error, key = *key, "Could not roll back partial write");
                    }
                }
                return Err(error);
            }
        }
        Ok(())
    }
}

/// Process-local storage
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(key);
        Ok(())
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in pairs {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }
}

/// One JSON document (`storage.json`) inside a directory
///
/// Writes go to a temporary file that is renamed over the document. Reads of
/// an unparsable document fail with [`StorageError::Corrupt`]; the next write
/// replaces it with a fresh one.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// File name of the document inside the storage directory
    pub const FILE_NAME: &'static str = "storage.json";

    /// Storage rooted at `dir`, created if missing
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Ok(Self {
            path: dir.as_ref().join(Self::FILE_NAME),
            lock: Mutex::new(()),
        })
    }

    /// Path of the JSON document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = match self.load() {
            Err(StorageError::Corrupt(error)) => {
                tracing::warn!(%error, path = %self.path.display(), "Storage document is corrupt, starting over");
                BTreeMap::new()
            },
            loaded => loaded?,
        };
        f(&mut entries);
        self.save(&entries)
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn set_all(&self, pairs: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|entries| {
            for (key, value) in pairs {
                entries.insert((*key).to_string(), (*value).to_string());
            }
        })
    }
}

/// Typed access to the persisted session and bus snapshot
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Wrap a key-value store
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// In-memory session store
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    /// The underlying key-value store
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn KeyValueStorage> {
        &self.storage
    }

    /// Read back a persisted session
    ///
    /// Both `token` and `user` must be present. A `user` that is not valid JSON,
    /// or an unreadable document, clears both keys. Other storage failures are
    /// logged and read as no session.
    #[must_use]
    pub fn restore(&self) -> Option<Session> {
        let (token, raw_user) = match (self.storage.get(TOKEN_KEY), self.storage.get(USER_KEY)) {
            (Ok(Some(token)), Ok(Some(raw_user))) => (token, raw_user),
            (Ok(_), Ok(_)) => return None,
            (Err(StorageError::Corrupt(error)), _) | (_, Err(StorageError::Corrupt(error))) => {
                tracing::warn!(%error, "Storage is corrupt, clearing session");
                if let Err(error) = self.clear() {
                    tracing::warn!(%error, "Could not clear corrupt session");
                }
                return None;
            },
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(%error, "Could not read persisted session");
                return None;
            },
        };

        match serde_json::from_str::<User>(&raw_user) {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "Restored session");
                Some(Session { token, user })
            },
            Err(error) => {
                tracing::warn!(%error, "Persisted user is corrupt, clearing session");
                if let Err(error) = self.clear() {
                    tracing::warn!(%error, "Could not clear corrupt session");
                }
                None
            },
        }
    }

    /// Persist `token` and `user` together
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the pair cannot be written; neither key is
    /// left behind on its own.
    pub fn persist(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)?;
        self.storage
            .set_all(&[(TOKEN_KEY, session.token.as_str()), (USER_KEY, user.as_str())])
    }

    /// Remove `token` and `user`
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if either key cannot be removed.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(TOKEN_KEY)?;
        self.storage.remove(USER_KEY)
    }

    /// Persist the bus being booked
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the snapshot cannot be written.
    pub fn save_selected_bus(&self, bus: &BusListing) -> Result<(), StorageError> {
        self.storage.set(SELECTED_BUS_KEY, &serde_json::to_string(bus)?)
    }

    /// Read the bus snapshot; a corrupt snapshot is removed and read as none
    #[must_use]
    pub fn selected_bus(&self) -> Option<BusListing> {
        let raw = match self.storage.get(SELECTED_BUS_KEY) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(%error, "Could not read selected bus snapshot");
                return None;
            },
        };

        serde_json::from_str(&raw)
            .inspect_err(|error| {
                tracing::warn!(%error, "Selected bus snapshot is corrupt, removing it");
                if let Err(error) = self.storage.remove(SELECTED_BUS_KEY) {
                    tracing::warn!(%error, "Could not remove corrupt bus snapshot");
                }
            })
            .ok()
    }
}
