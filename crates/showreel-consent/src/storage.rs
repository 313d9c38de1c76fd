//! Client Storage
//!
//! String-valued key-value stores standing in for `localStorage` and
//! `sessionStorage`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::StorageError;

/// Key used by [`storage_available`]
const CHECK_KEY: &str = "__storage_test__";

/// Durable, string-valued key-value storage
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&mut self, key: &str) -> Result<(), StorageError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get_item(&self, key: &str) -> Option<String> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// In-memory storage (sessionStorage)
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    data: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        self.data.remove(key);
        Ok(())
    }
}

/// Persistent storage (localStorage) backed by a JSON object on disk.
///
/// Every mutation rewrites the file.
#[derive(Debug)]
pub struct FileStorage {
    data: BTreeMap<String, String>,
    path: PathBuf,
}

impl FileStorage {
    /// Open `path`, loading existing entries. A missing file is empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            BTreeMap::new()
        };
        tracing::debug!("Opened storage {} ({} keys)", path.display(), data.len());
        Ok(Self { data, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.data.get(key).cloned()
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.data.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove_item(&mut self, key: &str) -> Result<(), StorageError> {
        if self.data.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// Whether `store` round-trips a value. Private browsing modes and
/// blocked storage fail this.
pub fn storage_available(store: &mut impl KeyValueStore) -> bool {
    if store.set_item(CHECK_KEY, "1").is_err() {
        return false;
    }
    let ok = store.get_item(CHECK_KEY).as_deref() == Some("1");
    let _ = store.remove_item(CHECK_KEY);
    ok
}
