// Rate limit information and the per-run tracker.
// Each API response fully supersedes the previously recorded quota.

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::Serialize;

/// Rate limit information from response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitInfo {
    pub limit: u64,
    pub remaining: u64,
    pub reset_at: DateTime<Utc>,
}

impl RateLimitInfo {
    /// Parse the `x-ratelimit-*` headers. Returns `None` unless all three are present.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let number = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse().ok())
        };

        let limit = number("x-ratelimit-limit")?;
        let remaining = number("x-ratelimit-remaining")?;
        let reset = number("x-ratelimit-reset")?;
        let reset_at = DateTime::from_timestamp(i64::try_from(reset).ok()?, 0)?;

        Some(Self {
            limit,
            remaining,
            reset_at,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

/// Latest quota observed during one pipeline run.
///
/// Owned by the caller and passed down explicitly. Updates are last-write-wins.
#[derive(Debug, Default)]
pub struct RateLimitTracker {
    latest: Mutex<Option<RateLimitInfo>>,
}

impl RateLimitTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, info: RateLimitInfo) {
        let mut latest = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *latest = Some(info);
    }

    pub fn latest(&self) -> Option<RateLimitInfo> {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }
}
