//! Durable user preferences (theme, font size, language).
//!
//! Storage failures never reach callers: [`PreferenceStore`] logs them and
//! degrades to a no-op write or an absent read, so a broken store can never
//! stop the page from rendering.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::error;

/// A named preference and its storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preference {
    Theme,
    FontSize,
    Language,
}

impl Preference {
    pub fn key(&self) -> &'static str {
        match self {
            Preference::Theme => "theme",
            Preference::FontSize => "fontSize",
            Preference::Language => "language",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded writing {key:?} ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt preference file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A synchronous string key-value store.
pub trait StorageBackend: Send {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Session-lifetime storage with an optional byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
    quota: Option<usize>,
    disabled: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total bytes (keys plus values) the store accepts.
    pub fn with_quota(mut self, bytes: usize) -> Self {
        self.quota = Some(bytes);
        self
    }

    /// A store that rejects every read and write, like browser storage with
    /// site data blocked.
    pub fn disabled() -> Self {
        Self {
            disabled: true,
            ..Self::default()
        }
    }

    fn used_bytes_without(&self, key: &str) -> usize {
        self.items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        if let Some(quota) = self.quota {
            let needed = self.used_bytes_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences persisted as a JSON object on disk.
///
/// Every write replaces the file through a temporary sibling so a crash
/// mid-write leaves the previous contents intact.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&contents).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_all(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(items).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

impl StorageBackend for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.read_all()?;
        items.insert(key.to_string(), value.to_string());
        self.write_all(&items)
    }
}

/// Fail-silent preference access over any [`StorageBackend`].
pub struct PreferenceStore {
    backend: Box<dyn StorageBackend>,
}

impl PreferenceStore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    /// In-memory store, used for pages without durable storage and in tests.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Last persisted value, or `None` if never set or the store failed.
    pub fn get(&self, preference: Preference) -> Option<String> {
        match self.backend.get_item(preference.key()) {
            Ok(value) => value,
            Err(e) => {
                error!("Error getting preference {}: {}", preference.key(), e);
                None
            }
        }
    }

    /// Saved value, or `default` when absent.
    pub fn get_or(&self, preference: Preference, default: &str) -> String {
        self.get(preference).unwrap_or_else(|| default.to_string())
    }

    /// Persist a value. Failures are logged and otherwise ignored.
    pub fn set(&mut self, preference: Preference, value: &str) {
        if let Err(e) = self.backend.set_item(preference.key(), value) {
            error!("Error saving preference {}: {}", preference.key(), e);
        }
    }
}

impl std::fmt::Debug for PreferenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreferenceStore").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_preference_keys() {
        assert_eq!(Preference::Theme.key(), "theme");
        assert_eq!(Preference::FontSize.key(), "fontSize");
        assert_eq!(Preference::Language.key(), "language");
    }

    #[test]
    fn test_set_then_get_returns_exact_value() {
        let mut store = PreferenceStore::in_memory();
        store.set(Preference::Theme, "dark");
        store.set(Preference::Language, "es");

        assert_eq!(store.get(Preference::Theme).as_deref(), Some("dark"));
        assert_eq!(store.get(Preference::Language).as_deref(), Some("es"));
        assert_eq!(store.get(Preference::FontSize), None);
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = PreferenceStore::in_memory();
        store.set(Preference::FontSize, "small");
        store.set(Preference::FontSize, "large");
        assert_eq!(store.get(Preference::FontSize).as_deref(), Some("large"));
    }

    #[test]
    fn test_get_or_falls_back_to_default() {
        let store = PreferenceStore::in_memory();
        assert_eq!(store.get_or(Preference::Language, "en"), "en");
    }

    #[test]
    fn test_disabled_store_never_raises() {
        let mut store = PreferenceStore::new(MemoryStorage::disabled());
        store.set(Preference::Theme, "dark");
        assert_eq!(store.get(Preference::Theme), None);
        assert_eq!(store.get_or(Preference::Theme, "light"), "light");
    }

    #[test]
    fn test_quota_exceeded_is_absorbed() {
        let mut store = PreferenceStore::new(MemoryStorage::new().with_quota(12));
        store.set(Preference::Theme, "dark"); // 5 + 4 bytes
        store.set(Preference::Language, "es"); // would need 9 + 10 bytes

        assert_eq!(store.get(Preference::Theme).as_deref(), Some("dark"));
        assert_eq!(store.get(Preference::Language), None);
    }

    #[test]
    fn test_quota_counts_replacement_not_duplicate() {
        let mut storage = MemoryStorage::new().with_quota(10);
        storage.set_item("theme", "dark").unwrap();
        storage.set_item("theme", "light").unwrap();
        assert!(matches!(
            storage.set_item("theme", "light-extra"),
            Err(StorageError::QuotaExceeded { .. })
        ));
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let mut store = PreferenceStore::new(FileStorage::new(&path));
        store.set(Preference::Theme, "dark");
        store.set(Preference::Language, "es");

        let reopened = PreferenceStore::new(FileStorage::new(&path));
        assert_eq!(reopened.get(Preference::Theme).as_deref(), Some("dark"));
        assert_eq!(reopened.get(Preference::Language).as_deref(), Some("es"));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_file_storage_missing_file_reads_absent() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("none.json"));
        assert_eq!(storage.get_item("theme").unwrap(), None);
    }

    #[test]
    fn test_file_storage_corrupt_file_degrades() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get_item("theme"),
            Err(StorageError::Corrupt { .. })
        ));

        let mut store = PreferenceStore::new(FileStorage::new(&path));
        assert_eq!(store.get(Preference::Theme), None);
        store.set(Preference::Theme, "dark");
        assert_eq!(store.get(Preference::Theme), None);
    }
}
