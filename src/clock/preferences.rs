//! Preference Storage Abstraction
//!
//! Durable key-value store for operator preferences (test-mode clock state).
//! Implementations target a local JSON file or memory (tests, embedding hosts
//! that persist elsewhere).

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::PreferenceError;

/// Read-after-write consistent string store
pub trait PreferenceStore {
    /// Fetch a value, `None` when the key was never written
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError>;

    /// Write a value, durable once this returns
    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError>;

    /// Delete a value; missing keys are not an error
    fn remove(&mut self, key: &str) -> Result<(), PreferenceError>;

    /// Write several values as one update: either all land or none change.
    ///
    /// The default applies them one by one and restores earlier keys when a
    /// later write fails.
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), PreferenceError> {
        let mut previous = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            previous.push((*key, self.get(key)?));
        }
        for (written, (key, value)) in entries.iter().enumerate() {
            if let Err(error) = self.set(key, value) {
                for (key, old) in previous[..written].iter().rev() {
                    let restored = match old {
                        Some(old) => self.set(key, old),
                        None => self.remove(key),
                    };
                    if let Err(reason) = restored {
                        warn!(key, %reason, "could not restore preference after failed update");
                    }
                }
                return Err(error);
            }
        }
        Ok(())
    }
}

/// JSON object file on the local filesystem
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file reads as an empty map
    fn load(&self) -> Result<BTreeMap<String, String>, PreferenceError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write through a sibling temp file so a crash never leaves half a file
    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(values)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }

    /// One read and one atomic rename for the whole batch
    fn set_many(&mut self, entries: &[(&str, &str)]) -> Result<(), PreferenceError> {
        let mut values = self.load()?;
        for (key, value) in entries {
            values.insert(key.to_string(), value.to_string());
        }
        self.save(&values)
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryPreferenceStore {
    values: HashMap<String, String>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FilePreferenceStore::new(temp_dir.path().join("prefs.json"));

        assert_eq!(store.get("missing").unwrap(), None);

        store.set("mode", "on").unwrap();
        assert_eq!(store.get("mode").unwrap().as_deref(), Some("on"));

        // A second handle on the same file sees the write
        let reopened = FilePreferenceStore::new(store.path());
        assert_eq!(reopened.get("mode").unwrap().as_deref(), Some("on"));

        store.remove("mode").unwrap();
        assert_eq!(store.get("mode").unwrap(), None);
    }

    #[test]
    fn test_file_store_creates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a/b/prefs.json");
        let mut store = FilePreferenceStore::new(&path);
        store.set("k", "v").unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_store_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("prefs.json");
        fs::write(&path, "{not json").unwrap();
        let store = FilePreferenceStore::new(&path);
        assert!(matches!(store.get("k"), Err(PreferenceError::Serialization(_))));
    }

    #[test]
    fn test_file_store_set_many_writes_once() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = FilePreferenceStore::new(temp_dir.path().join("prefs.json"));
        store.set("keep", "1").unwrap();
        store.set_many(&[("a", "x"), ("b", "y")]).unwrap();

        let reopened = FilePreferenceStore::new(store.path());
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("x"));
        assert_eq!(reopened.get("b").unwrap().as_deref(), Some("y"));
        assert_eq!(reopened.get("keep").unwrap().as_deref(), Some("1"));
    }

    /// Refuses writes to one key
    struct RejectingStore {
        inner: InMemoryPreferenceStore,
        rejected: &'static str,
    }

    impl PreferenceStore for RejectingStore {
        fn get(&self, key: &str) -> Result<Option<String>, PreferenceError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), PreferenceError> {
            if key == self.rejected {
                return Err(std::io::Error::other("disk full").into());
            }
            self.inner.set(key, value)
        }

        fn remove(&mut self, key: &str) -> Result<(), PreferenceError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn test_set_many_restores_earlier_keys_on_failure() {
        let mut store = RejectingStore {
            inner: InMemoryPreferenceStore::new(),
            rejected: "second",
        };
        store.inner.set("first", "old").unwrap();

        let result = store.set_many(&[("first", "new"), ("fresh", "v"), ("second", "x")]);
        assert!(matches!(result, Err(PreferenceError::Io(_))));
        assert_eq!(store.get("first").unwrap().as_deref(), Some("old"));
        assert_eq!(store.get("fresh").unwrap(), None);
        assert_eq!(store.get("second").unwrap(), None);
    }

    #[test]
    fn test_in_memory_store() {
        let mut store = InMemoryPreferenceStore::new();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
