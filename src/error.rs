// Error types for gh-activity.
// Separates terminal fetch errors from cache errors, which the pipeline only ever downgrades.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Rate limit exceeded, resets at {}", .reset_at.format("%Y-%m-%d %H:%M:%S UTC"))]
    RateLimited { reset_at: DateTime<Utc> },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Unexpected HTTP {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },

    #[error("Invalid API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failures of the local cache. Never fatal to a pipeline run.
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt cache entry at {}: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode cache entry for {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("no cache directory available on this platform")]
    NoCacheDir,
}

/// Stable, matchable classification of an [`ActivityError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Auth,
    RateLimited,
    Network,
    Api,
    Cache,
    Config,
}

impl ActivityError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ActivityError::NotFound(_) => ErrorKind::NotFound,
            ActivityError::Unauthorized => ErrorKind::Auth,
            ActivityError::RateLimited { .. } => ErrorKind::RateLimited,
            ActivityError::Network(_) => ErrorKind::Network,
            ActivityError::UnexpectedStatus { .. } | ActivityError::Decode(_) => ErrorKind::Api,
            ActivityError::Cache(_) => ErrorKind::Cache,
            ActivityError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether a retry at the transport layer could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ActivityError::Network(_) => true,
            ActivityError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short guidance shown under the error message.
    pub fn hint(&self) -> Option<String> {
        match self {
            ActivityError::NotFound(_) => Some("Check the spelling of the username.".to_string()),
            ActivityError::Unauthorized => Some(
                "Check the token, or omit it to use the unauthenticated rate limit.".to_string(),
            ),
            ActivityError::RateLimited { reset_at } => {
                let local = reset_at.with_timezone(&chrono::Local);
                Some(format!(
                    "Try again after {}, or supply a token for a higher limit.",
                    local.format("%H:%M:%S")
                ))
            }
            ActivityError::Network(_) => {
                Some("Check your network connection and try again.".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ActivityError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_is_stable_per_variant() {
        assert_eq!(
            ActivityError::NotFound("octocat".to_string()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(ActivityError::Unauthorized.kind(), ErrorKind::Auth);
        assert_eq!(
            ActivityError::RateLimited {
                reset_at: Utc::now()
            }
            .kind(),
            ErrorKind::RateLimited
        );
        assert_eq!(
            ActivityError::UnexpectedStatus {
                status: 502,
                body: String::new()
            }
            .kind(),
            ErrorKind::Api
        );
        assert_eq!(
            ActivityError::Cache(CacheError::NoCacheDir).kind(),
            ErrorKind::Cache
        );
    }

    #[test]
    fn test_transient_classification() {
        let server = ActivityError::UnexpectedStatus {
            status: 503,
            body: String::new(),
        };
        assert!(server.is_transient());

        let client = ActivityError::UnexpectedStatus {
            status: 422,
            body: String::new(),
        };
        assert!(!client.is_transient());

        assert!(!ActivityError::Unauthorized.is_transient());
        assert!(!ActivityError::NotFound("x".to_string()).is_transient());
    }

    #[test]
    fn test_rate_limited_message_includes_reset() {
        let reset_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let err = ActivityError::RateLimited { reset_at };
        assert!(err.to_string().contains("2023-11-14 22:13:20 UTC"));
        assert!(err.hint().unwrap().contains("Try again after"));
    }
}
