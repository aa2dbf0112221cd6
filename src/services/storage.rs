//! Local persistence for credentials, the selected label and the card set.
//!
//! Values are stored as JSON documents under fixed keys in a key-value
//! backend. The [`Storage`] facade never surfaces backend failures: reads that
//! fail are treated as "nothing stored" and writes that fail are logged and
//! dropped, so the UI keeps working on a read-only or missing data directory.

use anyhow::{anyhow, Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::models::{CardSet, Credentials};
use crate::services::sample;

/// Key holding the Trello credentials.
pub const CREDENTIALS_KEY: &str = "trello_credentials";
/// Key holding the last selected label id.
pub const SELECTED_LABEL_KEY: &str = "selected_label_id";
/// Key holding the card set.
pub const CARDS_KEY: &str = "trello_cards";

/// A string key-value backend.
pub trait KeyValueStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Directory-backed store with one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (creating if needed) a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Directory the store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value)
            .with_context(|| format!("Failed to write temp file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to rename temp file to: {}", path.display()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Process-local store used when nothing can be written to disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed access to the persisted application state.
///
/// Cloning is cheap; clones share the same backend, so a background worker
/// can write fetched cards while the UI holds its own handle.
#[derive(Clone)]
pub struct Storage {
    backend: Arc<dyn KeyValueStore>,
    persistent: bool,
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("persistent", &self.persistent)
            .finish_non_exhaustive()
    }
}

impl Storage {
    /// Opens file-backed storage in `data_dir`.
    ///
    /// Falls back to an in-memory store (and logs a warning) when no
    /// directory is given or it cannot be created.
    #[must_use]
    pub fn open(data_dir: Option<&Path>) -> Self {
        let Some(dir) = data_dir else {
            warn!("No data directory available, state will not persist");
            return Self::in_memory();
        };

        match FileStore::new(dir) {
            Ok(store) => {
                debug!("Using data directory {}", dir.display());
                Self::with_backend(Arc::new(store), true)
            }
            Err(e) => {
                warn!("Storage unavailable, state will not persist: {e:#}");
                Self::in_memory()
            }
        }
    }

    /// Storage that lives only as long as the process.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(Arc::new(MemoryStore::new()), false)
    }

    /// Wraps an arbitrary backend.
    #[must_use]
    pub fn with_backend(backend: Arc<dyn KeyValueStore>, persistent: bool) -> Self {
        Self {
            backend,
            persistent,
        }
    }

    /// Whether writes survive a restart.
    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Stored Trello credentials.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.read_json(CREDENTIALS_KEY)
    }

    /// Persists Trello credentials.
    pub fn set_credentials(&self, credentials: &Credentials) {
        self.write_json(CREDENTIALS_KEY, credentials);
    }

    /// Id of the last label the user fetched cards for.
    #[must_use]
    pub fn selected_label(&self) -> Option<String> {
        self.read_json(SELECTED_LABEL_KEY)
    }

    /// Remembers the selected label id.
    pub fn set_selected_label(&self, label_id: &str) {
        self.write_json(SELECTED_LABEL_KEY, &label_id);
    }

    /// The stored card set.
    #[must_use]
    pub fn cards(&self) -> Option<CardSet> {
        self.read_json(CARDS_KEY)
    }

    /// Replaces the stored card set.
    pub fn set_cards(&self, cards: &CardSet) {
        debug!(
            "Persisting {} cards ({})",
            cards.len(),
            if cards.is_arranged() {
                "arranged"
            } else {
                "fetched"
            }
        );
        self.write_json(CARDS_KEY, cards);
    }

    /// Deletes the stored card set.
    pub fn clear_cards(&self) {
        if let Err(e) = self.backend.remove(CARDS_KEY) {
            warn!("Failed to clear stored cards: {e:#}");
        }
    }

    /// Whether a non-empty card set is stored.
    #[must_use]
    pub fn has_cards(&self) -> bool {
        self.cards().is_some_and(|set| !set.is_empty())
    }

    /// Stores the sample cards unless a non-empty set already exists.
    ///
    /// Returns `true` when it seeded.
    pub fn seed_sample_cards_if_empty(&self) -> bool {
        if self.has_cards() {
            return false;
        }

        self.set_cards(&CardSet::Fetched {
            cards: sample::sample_cards(),
        });
        true
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.get(key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read '{key}': {e:#}");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Ignoring unreadable '{key}' entry: {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize '{key}': {e}");
                return;
            }
        };

        if let Err(e) = self.backend.set(key, &json) {
            warn!("Failed to write '{key}': {e:#}");
        }
    }
}
