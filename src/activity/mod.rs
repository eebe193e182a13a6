// Activity module.
// Normalized event model, repository identity, and filtering.

pub mod event;
pub mod filter;
pub mod repo;

pub use event::{EventKind, EventRecord, Payload};
pub use filter::EventFilter;
pub use repo::{RepoId, RepositoryEnrichment};

/// Sort newest first. Stable, so events sharing a timestamp keep feed order.
pub fn sort_newest_first(events: &mut [EventRecord]) {
    events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
