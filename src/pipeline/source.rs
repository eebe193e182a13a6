// Network-facing seams of the pipeline.
// GitHubClient implements both; tests substitute in-memory fakes.

use async_trait::async_trait;

use crate::activity::{EventRecord, RepoId, RepositoryEnrichment};
use crate::error::Result;
use crate::github::RateLimitTracker;

/// Retrieves a user's activity feed, normalized.
#[async_trait]
pub trait ActivitySource: Send + Sync {
    /// Fetch at most `max_events` events for `username`.
    ///
    /// A user with no activity yields an empty list; an unknown user is
    /// [`ActivityError::NotFound`](crate::error::ActivityError::NotFound).
    /// Every response seen is recorded in `tracker`, failures included.
    async fn fetch_events(
        &self,
        username: &str,
        max_events: usize,
        tracker: &RateLimitTracker,
    ) -> Result<Vec<EventRecord>>;
}

/// Retrieves supplementary metadata for one repository.
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn fetch_repository(
        &self,
        repo: &RepoId,
        tracker: &RateLimitTracker,
    ) -> Result<RepositoryEnrichment>;
}
