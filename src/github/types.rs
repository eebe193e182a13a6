// GitHub API response types.
// Raw shapes of the events feed and repository endpoints, before normalization.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Actor of an event.
#[derive(Debug, Clone, Deserialize)]
pub struct RawActor {
    pub login: String,
}

/// Repository reference embedded in an event.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepoRef {
    /// `owner/name`.
    pub name: String,
}

/// One entry from `/users/{user}/events`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    pub actor: RawActor,
    pub repo: RawRepoRef,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// GitHub repository, as returned by `/repos/{owner}/{name}`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepository {
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub language: Option<String>,
    pub html_url: Option<String>,
}
