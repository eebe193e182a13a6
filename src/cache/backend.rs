// Storage backends for cached event lists.
// The file backend survives restarts; the memory backend serves tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::activity::EventRecord;
use crate::error::CacheError;

use super::paths::entry_path;
use super::store::{self, CachedData};

pub type CachedEvents = CachedData<Vec<EventRecord>>;

/// Keyed storage for cached event lists.
pub trait CacheBackend: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<CachedEvents>, CacheError>;
    fn save(&self, key: &str, entry: &CachedEvents) -> Result<(), CacheError>;
    fn remove(&self, key: &str) -> Result<(), CacheError>;
}

impl<B: CacheBackend + ?Sized> CacheBackend for Arc<B> {
    fn load(&self, key: &str) -> Result<Option<CachedEvents>, CacheError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, entry: &CachedEvents) -> Result<(), CacheError> {
        (**self).save(key, entry)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        (**self).remove(key)
    }
}

/// One JSON file per key under a base directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    base: PathBuf,
}

impl FileBackend {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Backend rooted at the platform cache directory.
    pub fn from_default_dir() -> Result<Self, CacheError> {
        super::paths::cache_dir()
            .map(Self::new)
            .ok_or(CacheError::NoCacheDir)
    }

    pub fn base(&self) -> &std::path::Path {
        &self.base
    }
}

impl CacheBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<CachedEvents>, CacheError> {
        store::read_cached(&entry_path(&self.base, key))
    }

    fn save(&self, key: &str, entry: &CachedEvents) -> Result<(), CacheError> {
        store::write_cached(&entry_path(&self.base, key), entry)
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        store::delete(&entry_path(&self.base, key))
    }
}

/// Process-local backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, CachedEvents>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<CachedEvents>, CacheError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, entry: &CachedEvents) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}
