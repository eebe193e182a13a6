// Repository identity and enrichment types.
// RepoId is the owner/name pair events are filtered and enriched by.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Repository identifier as an owner/name pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Owner compares case-insensitively, name exactly.
    pub fn matches(&self, other: &RepoId) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name == other.name
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, name))
                if !owner.is_empty() && !name.is_empty() && !name.contains('/') =>
            {
                Ok(Self::new(owner, name))
            }
            _ => Err(format!("expected owner/name, got '{}'", s)),
        }
    }
}

impl TryFrom<String> for RepoId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.to_string()
    }
}

/// Supplementary repository metadata attached on request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEnrichment {
    pub repo: RepoId,
    pub stars: u64,
    pub forks: u64,
    pub description: Option<String>,
    pub language: Option<String>,
    pub html_url: Option<String>,
}
