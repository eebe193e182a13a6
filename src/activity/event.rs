// Normalized activity event model.
// EventKind and Payload replace free-form JSON access to provider event shapes.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::repo::{RepoId, RepositoryEnrichment};

/// Event type vocabulary. Unrecognized types keep their raw name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    Push,
    PullRequest,
    PullRequestReview,
    PullRequestReviewComment,
    Issues,
    IssueComment,
    Create,
    Delete,
    Fork,
    Watch,
    Release,
    Public,
    Member,
    Gollum,
    CommitComment,
    Other(String),
}

impl EventKind {
    /// Parse an event type name, case-insensitively.
    ///
    /// Accepts the API names (`PushEvent`), their lowercase forms and the
    /// short aliases used on the command line (`push`, `pr`, `star`).
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        let lower = trimmed.to_ascii_lowercase();
        let stem = lower.strip_suffix("event").unwrap_or(&lower);
        match stem {
            "push" => EventKind::Push,
            "pullrequest" | "pull_request" | "pr" => EventKind::PullRequest,
            "pullrequestreview" | "review" => EventKind::PullRequestReview,
            "pullrequestreviewcomment" | "review_comment" => EventKind::PullRequestReviewComment,
            "issues" | "issue" => EventKind::Issues,
            "issuecomment" | "comment" => EventKind::IssueComment,
            "create" => EventKind::Create,
            "delete" => EventKind::Delete,
            "fork" => EventKind::Fork,
            "watch" | "star" => EventKind::Watch,
            "release" => EventKind::Release,
            "public" => EventKind::Public,
            "member" => EventKind::Member,
            "gollum" | "wiki" => EventKind::Gollum,
            "commitcomment" => EventKind::CommitComment,
            _ => EventKind::Other(trimmed.to_string()),
        }
    }

    /// The provider's type name.
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Push => "PushEvent",
            EventKind::PullRequest => "PullRequestEvent",
            EventKind::PullRequestReview => "PullRequestReviewEvent",
            EventKind::PullRequestReviewComment => "PullRequestReviewCommentEvent",
            EventKind::Issues => "IssuesEvent",
            EventKind::IssueComment => "IssueCommentEvent",
            EventKind::Create => "CreateEvent",
            EventKind::Delete => "DeleteEvent",
            EventKind::Fork => "ForkEvent",
            EventKind::Watch => "WatchEvent",
            EventKind::Release => "ReleaseEvent",
            EventKind::Public => "PublicEvent",
            EventKind::Member => "MemberEvent",
            EventKind::Gollum => "GollumEvent",
            EventKind::CommitComment => "CommitCommentEvent",
            EventKind::Other(raw) => raw,
        }
    }

    /// Filter comparison: known kinds by variant, raw kinds by name ignoring case.
    pub fn matches(&self, other: &EventKind) -> bool {
        match (self, other) {
            (EventKind::Other(a), EventKind::Other(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(value: String) -> Self {
        EventKind::parse(&value)
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Type-specific event details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Push {
        commits: u64,
        git_ref: Option<String>,
        head: Option<String>,
        #[serde(default)]
        messages: Vec<String>,
    },
    PullRequest {
        action: String,
        number: u64,
        title: Option<String>,
    },
    PullRequestReview {
        action: String,
        number: u64,
    },
    PullRequestReviewComment {
        action: String,
        number: u64,
    },
    Issues {
        action: String,
        number: u64,
        title: Option<String>,
    },
    IssueComment {
        action: String,
        number: u64,
    },
    Create {
        ref_type: String,
        git_ref: Option<String>,
    },
    Delete {
        ref_type: String,
        git_ref: Option<String>,
    },
    Fork {
        forkee: Option<String>,
    },
    Watch {
        action: String,
    },
    Release {
        action: String,
        tag: Option<String>,
    },
    Member {
        action: String,
        member: Option<String>,
    },
    Gollum {
        pages: u64,
    },
    CommitComment {
        commit_id: Option<String>,
    },
    Public,
    Other {
        #[serde(default)]
        fields: serde_json::Map<String, serde_json::Value>,
    },
}

/// One normalized activity event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub actor: String,
    pub repo: RepoId,
    pub created_at: DateTime<Utc>,
    pub payload: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_details: Option<RepositoryEnrichment>,
}

impl EventRecord {
    /// Copy of this event with repository details attached.
    pub fn with_enrichment(self, details: RepositoryEnrichment) -> Self {
        Self {
            repo_details: Some(details),
            ..self
        }
    }

    /// One-line human description of the event.
    pub fn summary(&self) -> String {
        let repo = &self.repo;
        match &self.payload {
            Payload::Push {
                commits, git_ref, ..
            } => {
                let noun = if *commits == 1 { "commit" } else { "commits" };
                match git_ref.as_deref().and_then(|r| r.strip_prefix("refs/heads/")) {
                    Some(branch) => format!("Pushed {} {} to {} ({})", commits, noun, repo, branch),
                    None => format!("Pushed {} {} to {}", commits, noun, repo),
                }
            }
            Payload::PullRequest { action, number, .. } => {
                format!("{} pull request #{} in {}", capitalize(action), number, repo)
            }
            Payload::PullRequestReview { number, .. } => {
                format!("Reviewed pull request #{} in {}", number, repo)
            }
            Payload::PullRequestReviewComment { number, .. } => {
                format!("Commented on pull request #{} in {}", number, repo)
            }
            Payload::Issues { action, number, .. } => {
                format!("{} issue #{} in {}", capitalize(action), number, repo)
            }
            Payload::IssueComment { number, .. } => {
                format!("Commented on issue #{} in {}", number, repo)
            }
            Payload::Create { ref_type, git_ref } => match git_ref {
                Some(name) if ref_type != "repository" => {
                    format!("Created {} {} in {}", ref_type, name, repo)
                }
                _ => format!("Created repository {}", repo),
            },
            Payload::Delete { ref_type, git_ref } => format!(
                "Deleted {} {} in {}",
                ref_type,
                git_ref.as_deref().unwrap_or("?"),
                repo
            ),
            Payload::Fork { forkee } => match forkee {
                Some(target) => format!("Forked {} to {}", repo, target),
                None => format!("Forked {}", repo),
            },
            Payload::Watch { .. } => format!("Starred {}", repo),
            Payload::Release { action, tag } => format!(
                "{} release {} in {}",
                capitalize(action),
                tag.as_deref().unwrap_or("?"),
                repo
            ),
            Payload::Member { action, member } => format!(
                "{} {} as a collaborator on {}",
                capitalize(action),
                member.as_deref().unwrap_or("a user"),
                repo
            ),
            Payload::Gollum { pages } => {
                let noun = if *pages == 1 { "page" } else { "pages" };
                format!("Updated {} wiki {} in {}", pages, noun, repo)
            }
            Payload::CommitComment { .. } => format!("Commented on a commit in {}", repo),
            Payload::Public => format!("Made {} public", repo),
            Payload::Other { .. } => format!("{} in {}", self.kind, repo),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
