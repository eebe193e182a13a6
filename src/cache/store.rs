// Cache store for reading and writing cached data.
// Handles JSON serialization, TTL checking, and atomic filesystem writes.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::CacheError;

/// Fixed time-to-live for cached activity: 10 minutes.
pub const CACHE_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was fetched from the API.
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    /// Check if this cached data has expired as of `now`.
    ///
    /// Entries stamped in the future count as expired.
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        let elapsed = now
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::MAX);

        elapsed >= ttl
    }

    /// Check if this cached data is still valid (not expired).
    pub fn is_valid(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        !self.is_expired(ttl, now)
    }
}

/// Read cached JSON data from a file.
pub fn read_cached<T: DeserializeOwned>(path: &Path) -> Result<Option<CachedData<T>>, CacheError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let cached = serde_json::from_str(&contents).map_err(|source| CacheError::Corrupt {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(cached))
}

/// Write data to cache as JSON.
pub fn write_cached<T: Serialize>(path: &Path, cached: &CachedData<T>) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let json = serde_json::to_string(cached).map_err(|source| CacheError::Encode {
        path: path.to_path_buf(),
        source,
    })?;

    // Write atomically via a per-process temp file so concurrent writers never interleave
    let temp_path = path.with_extension(format!("{}.tmp", std::process::id()));
    let result = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if let Err(source) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(io_err(source));
    }

    Ok(())
}

/// Delete a cached file. Missing files are not an error.
pub fn delete(path: &Path) -> Result<(), CacheError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CacheError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}
