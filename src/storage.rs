//! Persisted client-side preferences.
//!
//! The dashboard only needs a small string key/value store (the browser
//! version used `localStorage`). [`FileStorage`] keeps it in a JSON file under
//! the XDG data dir; [`MemoryStorage`] backs tests.

use crate::error::{PanelError, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key holding the auto-scroll preference
pub const AUTO_SCROLL_KEY: &str = "autoScroll";

/// String key/value store
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Read the saved auto-scroll flag; anything but `"true"` reads as off
pub fn load_auto_scroll(storage: &dyn Storage) -> Result<Option<bool>> {
    Ok(storage.get(AUTO_SCROLL_KEY)?.map(|v| v == "true"))
}

pub fn save_auto_scroll(storage: &dyn Storage, enabled: bool) -> Result<()> {
    storage.set(AUTO_SCROLL_KEY, if enabled { "true" } else { "false" })
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .lock()
            .map_err(|_| PanelError::Storage("memory storage lock poisoned".to_string()))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .lock()
            .map_err(|_| PanelError::Storage("memory storage lock poisoned".to_string()))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file store, rewritten atomically on every `set`
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    /// Store at the default state path
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(crate::config::state_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            PanelError::Storage(format!("Failed to parse {}: {e}", self.path.display()))
        })
    }

    /// Save to file atomically (tmp + rename)
    fn write_all(&self, values: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        let content = serde_json::to_string_pretty(values)
            .map_err(|e| PanelError::Storage(format!("Failed to serialize state: {e}")))?;

        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path)?;

        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| PanelError::Storage("file storage lock poisoned".to_string()))?;

        // A corrupt file is replaced rather than blocking new preferences
        let mut values = self.read_all().unwrap_or_else(|e| {
            tracing::warn!("Discarding unreadable state: {e}");
            BTreeMap::new()
        });
        values.insert(key.to_string(), value.to_string());
        self.write_all(&values)
    }
}
