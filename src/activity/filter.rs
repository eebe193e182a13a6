// Event filtering by type and repository.
// Both criteria are optional and compose conjunctively.

use super::event::{EventKind, EventRecord};
use super::repo::RepoId;

/// Type and repository criteria. Empty lists mean "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub types: Vec<EventKind>,
    pub repos: Vec<RepoId>,
}

impl EventFilter {
    /// Build a filter from command-line style type names.
    pub fn new<S: AsRef<str>>(types: &[S], repos: Vec<RepoId>) -> Self {
        Self {
            types: types.iter().map(|t| EventKind::parse(t.as_ref())).collect(),
            repos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.repos.is_empty()
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        let type_match = self.types.is_empty() || self.types.iter().any(|t| t.matches(&event.kind));
        let repo_match =
            self.repos.is_empty() || self.repos.iter().any(|r| r.matches(&event.repo));
        type_match && repo_match
    }

    /// Retain matching events, preserving input order.
    pub fn apply(&self, events: Vec<EventRecord>) -> Vec<EventRecord> {
        if self.is_empty() {
            return events;
        }
        events.into_iter().filter(|e| self.matches(e)).collect()
    }
}
