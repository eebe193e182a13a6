// Cache path utilities.
// Maps cache keys to files under the per-installation cache directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base cache directory (~/.cache/gh-activity on Linux).
pub fn cache_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "gh-activity").map(|dirs| dirs.cache_dir().to_path_buf())
}

/// Directory holding cached event lists.
pub fn events_dir(base: &Path) -> PathBuf {
    base.join("events")
}

/// Path to the cache file for a key.
pub fn entry_path(base: &Path, key: &str) -> PathBuf {
    events_dir(base).join(format!("{}.json", sanitize_name(key)))
}

/// Sanitize a name for use in filesystem paths.
/// Replaces problematic characters with underscores.
fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '.' => '_',
            _ => c,
        })
        .collect()
}
