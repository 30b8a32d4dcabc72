use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use anyhow::{Context, Result};

use super::SessionStorage;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

type Entries = BTreeMap<String, String>;

/// Stores the session record as a flat JSON object in `session.json`.
///
/// The file is deleted once its last key is removed.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: cache_dir.into().join(SESSION_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }
        let contents =
            std::fs::read_to_string(&self.path).context("Failed to read session file")?;
        serde_json::from_str(&contents).context("Failed to parse session file")
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        if entries.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to delete session file")?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write session file")?;
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // An unreadable file is replaced rather than blocking new writes
        let mut entries = self.read_entries().unwrap_or_default();
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let (mut entries, readable) = match self.read_entries() {
            Ok(entries) => (entries, true),
            Err(_) => (Entries::new(), false),
        };
        if entries.remove(key).is_none() && readable {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
