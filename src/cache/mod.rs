// Cache module for local activity caching.
// Keeps recently fetched event lists for a short TTL to avoid redundant API calls.

pub mod backend;
pub mod paths;
pub mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::activity::EventRecord;
use crate::error::CacheError;

pub use backend::{CacheBackend, CachedEvents, FileBackend, MemoryBackend};
pub use store::{CACHE_TTL, CachedData};

/// Identity of a cached query: everything that changes what a fetch returns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_user(username: &str, max_events: usize) -> Self {
        Self(format!("{}:{}", username.to_lowercase(), max_events))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// TTL-bounded event cache over a pluggable backend.
pub struct CacheStore {
    backend: Box<dyn CacheBackend>,
    bypass: bool,
}

impl CacheStore {
    pub fn new(backend: impl CacheBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            bypass: false,
        }
    }

    /// Switch to no-cache mode: reads miss and writes are dropped.
    pub fn bypass(mut self) -> Self {
        self.bypass = true;
        self
    }

    /// Cached events for `key` if present and younger than the TTL.
    pub fn get(&self, key: &CacheKey) -> Result<Option<Vec<EventRecord>>, CacheError> {
        self.get_at(key, Utc::now())
    }

    /// As [`CacheStore::get`], evaluated at a given instant.
    pub fn get_at(
        &self,
        key: &CacheKey,
        now: DateTime<Utc>,
    ) -> Result<Option<Vec<EventRecord>>, CacheError> {
        if self.bypass {
            return Ok(None);
        }

        match self.backend.load(key.as_str())? {
            Some(entry) if entry.is_valid(CACHE_TTL, now) => {
                debug!(key = %key, cached_at = %entry.cached_at, "Cache hit");
                Ok(Some(entry.data))
            }
            Some(entry) => {
                debug!(key = %key, cached_at = %entry.cached_at, "Cache entry expired");
                if let Err(e) = self.backend.remove(key.as_str()) {
                    debug!(key = %key, error = %e, "Failed to evict expired entry");
                }
                Ok(None)
            }
            None => {
                debug!(key = %key, "Cache miss");
                Ok(None)
            }
        }
    }

    /// Store events for `key`, replacing any previous entry.
    pub fn put(
        &self,
        key: &CacheKey,
        events: &[EventRecord],
        fetched_at: DateTime<Utc>,
    ) -> Result<(), CacheError> {
        if self.bypass {
            return Ok(());
        }

        let entry = CachedData::new(events.to_vec(), fetched_at);
        self.backend.save(key.as_str(), &entry)?;
        debug!(key = %key, count = events.len(), "Cached events");
        Ok(())
    }

    /// Drop any entry for `key`. Honored even in no-cache mode.
    pub fn invalidate(&self, key: &CacheKey) -> Result<(), CacheError> {
        self.backend.remove(key.as_str())
    }
}
