//! Durable key/value storage for client state.
//!
//! The session lives under a handful of fixed string keys, mirroring how a
//! browser client keeps it in local storage. [`FileStore`] persists all keys
//! in one JSON object file; [`MemoryStore`] is the non-durable variant used
//! by tests and short-lived tools.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{trace, warn};

use crate::atomic::{atomic_write_json, read_json_optional};
use crate::error::{PersistenceError, Result};

/// Key holding the access token.
pub const TOKEN_KEY: &str = "token";

/// Key holding the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Key holding the JSON-serialized user profile.
pub const USER_KEY: &str = "user";

/// Key holding the list of recently exchanged Google OAuth codes.
pub const USED_GOOGLE_CODES_KEY: &str = "usedGoogleCodes";

/// String key/value storage that survives process restarts.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Removes several keys as one update.
    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

type Entries = BTreeMap<String, String>;

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Key/value store backed by a single JSON file.
///
/// Every operation re-reads the file, so several processes sharing a state
/// directory observe each other's writes. Writes are atomic. A file that is
/// not a JSON object of strings reads as empty and is replaced on the next
/// update.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Entries> {
        Ok(self.load_checked()?.0)
    }

    /// Reads the entries; the flag is set when the file was unreadable JSON.
    fn load_checked(&self) -> Result<(Entries, bool)> {
        match read_json_optional(&self.path) {
            Ok(entries) => Ok((entries.unwrap_or_default(), false)),
            Err(PersistenceError::Serialization(e)) => {
                warn!(path = %self.path.display(), error = %e, "store file is corrupt, treating as empty");
                Ok((Entries::new(), true))
            }
            Err(e) => Err(e),
        }
    }

    fn update(&self, apply: impl FnOnce(&mut Entries) -> bool) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, corrupt) = self.load_checked()?;
        if apply(&mut entries) || corrupt {
            trace!(path = %self.path.display(), keys = entries.len(), "writing store");
            atomic_write_json(&self.path, &entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<()> {
        self.update(|entries| {
            let mut changed = false;
            for key in keys {
                changed |= entries.remove(*key).is_some();
            }
            changed
        })
    }
}

/// In-memory key/value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Entries>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `pairs`.
    pub fn with_entries<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let entries = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        lock(&self.entries).remove(key);
        Ok(())
    }
}
