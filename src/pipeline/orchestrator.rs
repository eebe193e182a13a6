// Pipeline orchestration: cache lookup, fetch on miss, filter, limit, enrich.
// Cache and per-repository enrichment failures become warnings; fetch failures propagate.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::activity::{EventFilter, EventRecord, sort_newest_first};
use crate::cache::{CacheKey, CacheStore};
use crate::error::Result;
use crate::github::{RateLimitInfo, RateLimitTracker};

use super::enrich::enrich_events;
use super::source::{ActivitySource, EnrichmentSource};

/// Default number of events requested from the feed.
pub const DEFAULT_MAX_EVENTS: usize = 100;
/// Default number of concurrent enrichment lookups.
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 4;

/// Per-run options.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    pub filter: EventFilter,
    /// Keep at most this many events after filtering.
    pub limit: Option<usize>,
    pub enrich: bool,
}

/// Normalized, filtered and optionally enriched activity.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub events: Vec<EventRecord>,
    /// Quota from the last API response of this run, if any call was made.
    pub rate_limit: Option<RateLimitInfo>,
    pub warnings: Vec<String>,
    pub from_cache: bool,
}

/// Composes the activity source, cache and enrichment source.
pub struct Pipeline {
    activity: Arc<dyn ActivitySource>,
    enrichment: Arc<dyn EnrichmentSource>,
    cache: CacheStore,
    max_events: usize,
    enrich_concurrency: usize,
}

impl Pipeline {
    pub fn new(
        activity: Arc<dyn ActivitySource>,
        enrichment: Arc<dyn EnrichmentSource>,
        cache: CacheStore,
    ) -> Self {
        Self {
            activity,
            enrichment,
            cache,
            max_events: DEFAULT_MAX_EVENTS,
            enrich_concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }

    pub fn with_max_events(mut self, max_events: usize) -> Self {
        self.max_events = max_events;
        self
    }

    pub fn with_enrich_concurrency(mut self, concurrency: usize) -> Self {
        self.enrich_concurrency = concurrency.max(1);
        self
    }

    pub fn cache_key(&self, username: &str) -> CacheKey {
        CacheKey::for_user(username, self.max_events)
    }

    /// Drop the cached feed for `username`.
    pub fn clear_cache(&self, username: &str) -> Result<()> {
        self.cache.invalidate(&self.cache_key(username))?;
        Ok(())
    }

    /// Run the pipeline for one user.
    ///
    /// `tracker` is updated by every API response, so quota stays observable
    /// when this returns an error.
    pub async fn run(
        &self,
        username: &str,
        options: &PipelineOptions,
        tracker: &Arc<RateLimitTracker>,
    ) -> Result<PipelineResult> {
        let key = self.cache_key(username);
        let mut warnings = Vec::new();

        let cached = match self.cache.get(&key) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, fetching instead");
                warnings.push(format!("cache read failed: {}", e));
                None
            }
        };

        let from_cache = cached.is_some();
        let events = match cached {
            Some(events) => {
                info!(username, count = events.len(), "Serving activity from cache");
                events
            }
            None => {
                let fetched_at = Utc::now();
                let mut events = self
                    .activity
                    .fetch_events(username, self.max_events, tracker)
                    .await?;
                sort_newest_first(&mut events);
                info!(username, count = events.len(), "Fetched activity");

                if let Err(e) = self.cache.put(&key, &events, fetched_at) {
                    warn!(key = %key, error = %e, "Cache write failed");
                    warnings.push(format!("cache write failed: {}", e));
                }
                events
            }
        };

        let mut events = options.filter.apply(events);
        debug!(matched = events.len(), "Applied filters");
        if let Some(limit) = options.limit {
            events.truncate(limit);
        }

        if options.enrich {
            let enriched = enrich_events(
                Arc::clone(&self.enrichment),
                events,
                self.enrich_concurrency,
                Arc::clone(tracker),
            )
            .await;
            events = enriched.events;
            warnings.extend(enriched.warnings);
        }

        Ok(PipelineResult {
            events,
            rate_limit: tracker.latest(),
            warnings,
            from_cache,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::DateTime;

    use crate::activity::event::tests::event;
    use crate::activity::{EventKind, RepoId, RepositoryEnrichment};
    use crate::cache::{CacheBackend, CachedEvents, MemoryBackend};
    use crate::error::{ActivityError, CacheError, ErrorKind};

    fn quota(remaining: u64) -> RateLimitInfo {
        RateLimitInfo {
            limit: 60,
            remaining,
            reset_at: DateTime::from_timestamp(1_700_003_600, 0).unwrap(),
        }
    }

    enum Behavior {
        Events(Vec<EventRecord>),
        NotFound,
        RateLimited,
    }

    struct FakeActivity {
        behavior: Behavior,
        calls: AtomicUsize,
    }

    impl FakeActivity {
        fn returning(events: Vec<EventRecord>) -> Arc<Self> {
            Arc::new(Self {
                behavior: Behavior::Events(events),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(behavior: Behavior) -> Arc<Self> {
            Arc::new(Self {
                behavior,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ActivitySource for FakeActivity {
        async fn fetch_events(
            &self,
            username: &str,
            max_events: usize,
            tracker: &RateLimitTracker,
        ) -> Result<Vec<EventRecord>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u64;
            match &self.behavior {
                Behavior::Events(events) => {
                    tracker.record(quota(59 - call));
                    Ok(events.iter().take(max_events).cloned().collect())
                }
                Behavior::NotFound => {
                    tracker.record(quota(59 - call));
                    Err(ActivityError::NotFound(format!("user '{}'", username)))
                }
                Behavior::RateLimited => {
                    tracker.record(quota(0));
                    Err(ActivityError::RateLimited {
                        reset_at: quota(0).reset_at,
                    })
                }
            }
        }
    }

    #[derive(Default)]
    struct FakeEnrichment {
        failing: HashSet<RepoId>,
        calls: Mutex<Vec<RepoId>>,
    }

    impl FakeEnrichment {
        fn failing_for(repo: &str) -> Arc<Self> {
            Arc::new(Self {
                failing: HashSet::from([repo.parse().unwrap()]),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<RepoId> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EnrichmentSource for FakeEnrichment {
        async fn fetch_repository(
            &self,
            repo: &RepoId,
            tracker: &RateLimitTracker,
        ) -> Result<RepositoryEnrichment> {
            self.calls.lock().unwrap().push(repo.clone());
            tracker.record(quota(40));
            if self.failing.contains(repo) {
                return Err(ActivityError::UnexpectedStatus {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(RepositoryEnrichment {
                repo: repo.clone(),
                stars: 10,
                forks: 2,
                description: Some(format!("{} description", repo)),
                language: None,
                html_url: None,
            })
        }
    }

    /// Backend whose reads and writes always fail.
    struct BrokenBackend;

    impl CacheBackend for BrokenBackend {
        fn load(&self, _key: &str) -> std::result::Result<Option<CachedEvents>, CacheError> {
            Err(CacheError::Io {
                path: "broken.json".into(),
                source: std::io::Error::other("disk on fire"),
            })
        }

        fn save(&self, _key: &str, _entry: &CachedEvents) -> std::result::Result<(), CacheError> {
            Err(CacheError::NoCacheDir)
        }

        fn remove(&self, _key: &str) -> std::result::Result<(), CacheError> {
            Ok(())
        }
    }

    fn pipeline(
        activity: &Arc<FakeActivity>,
        enrichment: &Arc<FakeEnrichment>,
        cache: CacheStore,
    ) -> Pipeline {
        let activity: Arc<dyn ActivitySource> = activity.clone();
        let enrichment: Arc<dyn EnrichmentSource> = enrichment.clone();
        Pipeline::new(activity, enrichment, cache)
    }

    /// 30 events, unsorted, cycling through three kinds and two repos.
    fn mixed_feed() -> Vec<EventRecord> {
        let kinds = [EventKind::Push, EventKind::Watch, EventKind::Issues];
        let repos = ["torvalds/linux", "torvalds/subsurface"];
        (0..30)
            .map(|i| {
                let minutes_ago = (i * 7) % 30;
                event(
                    &i.to_string(),
                    kinds[i as usize % 3].clone(),
                    repos[i as usize % 2],
                    minutes_ago,
                )
            })
            .collect()
    }

    fn assert_sorted(events: &[EventRecord]) {
        assert!(events.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }

    #[tokio::test]
    async fn test_push_filter_without_cache() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let cache = CacheStore::new(MemoryBackend::new()).bypass();
        let pipeline = pipeline(&activity, &enrichment, cache);

        let options = PipelineOptions {
            filter: EventFilter::new(&["PushEvent"], Vec::new()),
            ..PipelineOptions::default()
        };
        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline.run("torvalds", &options, &tracker).await.unwrap();

        assert_eq!(activity.calls(), 1);
        assert_eq!(result.events.len(), 10);
        assert!(result.events.iter().all(|e| e.kind == EventKind::Push));
        assert_sorted(&result.events);
        assert!(!result.from_cache);
        assert_eq!(result.rate_limit, Some(quota(59)));
    }

    #[tokio::test]
    async fn test_unknown_user_fails_and_writes_nothing() {
        let activity = FakeActivity::failing(Behavior::NotFound);
        let enrichment = Arc::new(FakeEnrichment::default());
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(backend.clone()));

        let tracker = Arc::new(RateLimitTracker::new());
        let err = pipeline
            .run(
                "this-user-should-not-exist-xyz123",
                &PipelineOptions::default(),
                &tracker,
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(backend.is_empty());
        assert!(tracker.latest().is_some());
    }

    #[tokio::test]
    async fn test_rate_limited_keeps_quota_observable() {
        let activity = FakeActivity::failing(Behavior::RateLimited);
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let tracker = Arc::new(RateLimitTracker::new());
        let err = pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert_eq!(tracker.latest().unwrap().remaining, 0);
    }

    #[tokio::test]
    async fn test_fresh_cache_entry_skips_fetch() {
        let cached = vec![
            event("b", EventKind::Push, "octocat/hello", 1),
            event("a", EventKind::Watch, "octocat/hello", 2),
        ];
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(backend.clone()));

        CacheStore::new(backend)
            .put(
                &pipeline.cache_key("octocat"),
                &cached,
                Utc::now() - chrono::Duration::minutes(9),
            )
            .unwrap();

        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap();

        assert_eq!(activity.calls(), 0);
        assert_eq!(result.events, cached);
        assert!(result.from_cache);
        assert!(result.rate_limit.is_none());
    }

    #[tokio::test]
    async fn test_stale_cache_entry_fetches() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(backend.clone()));

        CacheStore::new(backend)
            .put(
                &pipeline.cache_key("octocat"),
                &[event("old", EventKind::Push, "octocat/hello", 1)],
                Utc::now() - chrono::Duration::minutes(11),
            )
            .unwrap();

        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap();

        assert_eq!(activity.calls(), 1);
        assert_eq!(result.events.len(), 30);
        assert!(!result.from_cache);
    }

    #[tokio::test]
    async fn test_bypass_always_fetches() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let backend = Arc::new(MemoryBackend::new());

        let warm = CacheStore::new(backend.clone());
        warm.put(
            &CacheKey::for_user("octocat", DEFAULT_MAX_EVENTS),
            &[event("cached", EventKind::Push, "octocat/hello", 1)],
            Utc::now(),
        )
        .unwrap();

        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(backend).bypass());
        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap();

        assert_eq!(activity.calls(), 1);
        assert_eq!(result.events.len(), 30);
    }

    #[tokio::test]
    async fn test_second_run_within_ttl_is_identical() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let options = PipelineOptions {
            filter: EventFilter::new(&["watch"], Vec::new()),
            ..PipelineOptions::default()
        };
        let tracker = Arc::new(RateLimitTracker::new());
        let first = pipeline.run("octocat", &options, &tracker).await.unwrap();
        let second = pipeline.run("OctoCat", &options, &tracker).await.unwrap();

        assert_eq!(activity.calls(), 1);
        assert_eq!(first.events, second.events);
        assert!(second.from_cache);
        assert_sorted(&second.events);
    }

    #[tokio::test]
    async fn test_cache_failures_degrade_to_warnings() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(BrokenBackend));

        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap();

        assert_eq!(activity.calls(), 1);
        assert_eq!(result.events.len(), 30);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].starts_with("cache read failed"));
        assert!(result.warnings[1].starts_with("cache write failed"));
    }

    #[tokio::test]
    async fn test_enrichment_once_per_repository() {
        let feed: Vec<EventRecord> = (0..5)
            .map(|i| event(&i.to_string(), EventKind::Push, "octocat/hello", i))
            .collect();
        let activity = FakeActivity::returning(feed);
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let options = PipelineOptions {
            enrich: true,
            ..PipelineOptions::default()
        };
        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline.run("octocat", &options, &tracker).await.unwrap();

        assert_eq!(enrichment.calls(), vec![RepoId::new("octocat", "hello")]);
        assert_eq!(result.events.len(), 5);
        assert!(result.events.iter().all(|e| e.repo_details.is_some()));
        assert!(result.warnings.is_empty());
        assert_eq!(result.rate_limit.unwrap().remaining, 40);
    }

    #[tokio::test]
    async fn test_enrichment_failure_is_a_warning() {
        let feed = vec![
            event("1", EventKind::Push, "octocat/hello", 1),
            event("2", EventKind::Push, "octocat/broken", 2),
            event("3", EventKind::Watch, "octocat/hello", 3),
        ];
        let activity = FakeActivity::returning(feed);
        let enrichment = FakeEnrichment::failing_for("octocat/broken");
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let options = PipelineOptions {
            enrich: true,
            ..PipelineOptions::default()
        };
        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline.run("octocat", &options, &tracker).await.unwrap();

        assert_eq!(result.events.len(), 3);
        for event in &result.events {
            let expect_details = event.repo.name == "hello";
            assert_eq!(event.repo_details.is_some(), expect_details);
        }
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("octocat/broken"));
    }

    #[tokio::test]
    async fn test_enrichment_only_covers_filtered_and_limited_events() {
        let feed = vec![
            event("1", EventKind::Push, "octocat/one", 1),
            event("2", EventKind::Watch, "octocat/two", 2),
            event("3", EventKind::Push, "octocat/three", 3),
            event("4", EventKind::Push, "octocat/four", 4),
        ];
        let activity = FakeActivity::returning(feed);
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let options = PipelineOptions {
            filter: EventFilter::new(&["push"], Vec::new()),
            limit: Some(2),
            enrich: true,
        };
        let tracker = Arc::new(RateLimitTracker::new());
        let result = pipeline.run("octocat", &options, &tracker).await.unwrap();

        let ids: Vec<&str> = result.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);

        let mut called = enrichment.calls();
        called.sort();
        assert_eq!(
            called,
            vec![RepoId::new("octocat", "one"), RepoId::new("octocat", "three")]
        );
    }

    #[tokio::test]
    async fn test_cached_entries_are_stored_sorted() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let backend = Arc::new(MemoryBackend::new());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(backend.clone()));

        let tracker = Arc::new(RateLimitTracker::new());
        pipeline
            .run("octocat", &PipelineOptions::default(), &tracker)
            .await
            .unwrap();

        let stored = backend
            .load(pipeline.cache_key("octocat").as_str())
            .unwrap()
            .unwrap();
        assert_eq!(stored.data.len(), 30);
        assert_sorted(&stored.data);
    }

    #[tokio::test]
    async fn test_clear_cache_forces_fetch() {
        let activity = FakeActivity::returning(mixed_feed());
        let enrichment = Arc::new(FakeEnrichment::default());
        let pipeline = pipeline(&activity, &enrichment, CacheStore::new(MemoryBackend::new()));

        let tracker = Arc::new(RateLimitTracker::new());
        let options = PipelineOptions::default();
        pipeline.run("octocat", &options, &tracker).await.unwrap();
        pipeline.clear_cache("octocat").unwrap();
        pipeline.run("octocat", &options, &tracker).await.unwrap();

        assert_eq!(activity.calls(), 2);
    }
}
