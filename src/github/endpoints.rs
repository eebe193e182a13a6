// GitHub API endpoint functions.
// Paginated user events feed and repository lookups, plus the pipeline source impls.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::activity::{EventRecord, RepoId, RepositoryEnrichment};
use crate::error::{ActivityError, Result};
use crate::pipeline::{ActivitySource, EnrichmentSource};

use super::client::GitHubClient;
use super::convert::{to_enrichment, to_event_record};
use super::rate_limit::RateLimitTracker;
use super::types::{RawEvent, RawRepository};

/// The events API serves at most this many events per user.
pub const MAX_FEED_EVENTS: usize = 300;

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

impl GitHubClient {
    /// Get a user's public events, newest first as served, up to `max_events`.
    ///
    /// `max_events` is clamped to [`MAX_FEED_EVENTS`].
    pub async fn list_user_events(
        &self,
        username: &str,
        max_events: usize,
        tracker: &RateLimitTracker,
    ) -> Result<Vec<RawEvent>> {
        let max_events = max_events.min(MAX_FEED_EVENTS);
        if max_events == 0 {
            return Ok(Vec::new());
        }

        let per_page = self.per_page().min(max_events);
        let max_pages = MAX_FEED_EVENTS.div_ceil(per_page);
        let resource = format!("user '{}'", username);
        let mut events = Vec::new();

        for page in 1..=max_pages {
            let params = [
                ("page", page.to_string()),
                ("per_page", per_page.to_string()),
            ];
            let response = match self
                .get_with_params(&["users", username, "events"], &params, &resource, tracker)
                .await
            {
                Ok(response) => response,
                // Paging past the feed window answers 422
                Err(ActivityError::UnexpectedStatus { status: 422, .. }) if page > 1 => {
                    debug!(username, page, "Reached the end of the events window");
                    break;
                }
                Err(e) => return Err(e),
            };
            let batch: Vec<RawEvent> = decode(response).await?;
            let count = batch.len();
            debug!(username, page, count, "Fetched events page");

            events.extend(batch);
            if events.len() >= max_events {
                events.truncate(max_events);
                break;
            }
            if count < per_page {
                break;
            }
        }

        Ok(events)
    }

    /// Get a specific repository.
    pub async fn get_repo(&self, repo: &RepoId, tracker: &RateLimitTracker) -> Result<RawRepository> {
        let resource = format!("repository {}", repo);
        let no_params: [(&str, &str); 0] = [];
        let response = self
            .get_with_params(
                &["repos", repo.owner.as_str(), repo.name.as_str()],
                &no_params,
                &resource,
                tracker,
            )
            .await?;
        decode(response).await
    }
}

#[async_trait]
impl ActivitySource for GitHubClient {
    async fn fetch_events(
        &self,
        username: &str,
        max_events: usize,
        tracker: &RateLimitTracker,
    ) -> Result<Vec<EventRecord>> {
        let raw = self.list_user_events(username, max_events, tracker).await?;
        let total = raw.len();
        let events: Vec<EventRecord> = raw.into_iter().filter_map(to_event_record).collect();
        if events.len() < total {
            warn!(
                username,
                skipped = total - events.len(),
                "Skipped events with malformed repository names"
            );
        }
        Ok(events)
    }
}

#[async_trait]
impl EnrichmentSource for GitHubClient {
    async fn fetch_repository(
        &self,
        repo: &RepoId,
        tracker: &RateLimitTracker,
    ) -> Result<RepositoryEnrichment> {
        let raw = self.get_repo(repo, tracker).await?;
        Ok(to_enrichment(repo, raw))
    }
}
