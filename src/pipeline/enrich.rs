// Repository enrichment stage.
// One lookup per distinct repository, run concurrently under a permit limit.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::activity::{EventRecord, RepoId, RepositoryEnrichment};
use crate::error::ActivityError;
use crate::github::RateLimitTracker;

use super::source::EnrichmentSource;

/// Outcome of enriching a set of events.
#[derive(Debug, Default)]
pub struct Enriched {
    pub events: Vec<EventRecord>,
    pub warnings: Vec<String>,
}

/// Distinct repositories in order of first appearance.
pub fn distinct_repos(events: &[EventRecord]) -> Vec<RepoId> {
    let mut seen = HashSet::new();
    let mut repos = Vec::new();
    for event in events {
        if seen.insert(&event.repo) {
            repos.push(event.repo.clone());
        }
    }
    repos
}

/// Attach repository details to `events`.
///
/// A failed lookup leaves that repository's events bare and adds one warning.
pub async fn enrich_events(
    source: Arc<dyn EnrichmentSource>,
    events: Vec<EventRecord>,
    concurrency: usize,
    tracker: Arc<RateLimitTracker>,
) -> Enriched {
    let repos = distinct_repos(&events);
    if repos.is_empty() {
        return Enriched {
            events,
            warnings: Vec::new(),
        };
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut join_set: JoinSet<(RepoId, Result<RepositoryEnrichment, ActivityError>)> =
        JoinSet::new();

    for repo in &repos {
        let source = Arc::clone(&source);
        let semaphore = Arc::clone(&semaphore);
        let tracker = Arc::clone(&tracker);
        let repo = repo.clone();

        join_set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let result = source.fetch_repository(&repo, &tracker).await;
            (repo, result)
        });
    }

    let mut details: HashMap<RepoId, RepositoryEnrichment> = HashMap::new();
    let mut failures: HashMap<RepoId, ActivityError> = HashMap::new();
    let mut task_errors = Vec::new();

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((repo, Ok(found))) => {
                debug!(repo = %repo, stars = found.stars, "Enriched repository");
                details.insert(repo, found);
            }
            Ok((repo, Err(e))) => {
                warn!(repo = %repo, error = %e, "Enrichment failed");
                failures.insert(repo, e);
            }
            Err(e) => task_errors.push(format!("enrichment task failed: {}", e)),
        }
    }

    // Report in repository order so output is stable across runs
    let mut warnings: Vec<String> = repos
        .iter()
        .filter_map(|repo| {
            failures
                .get(repo)
                .map(|e| format!("could not enrich {}: {}", repo, e))
        })
        .collect();
    warnings.extend(task_errors);

    let events = events
        .into_iter()
        .map(|event| match details.get(&event.repo) {
            Some(found) => event.with_enrichment(found.clone()),
            None => event,
        })
        .collect();

    Enriched { events, warnings }
}
