// Conversion from raw GitHub API types to the normalized activity model.
// Payload fields are read best-effort; missing values never reject an event.

use serde_json::Value;

use crate::activity::{EventKind, EventRecord, Payload, RepoId, RepositoryEnrichment};

use super::types::{RawEvent, RawRepository};

fn text(payload: &Value, pointer: &str) -> Option<String> {
    payload
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(String::from)
}

fn number(payload: &Value, pointer: &str) -> Option<u64> {
    payload.pointer(pointer).and_then(Value::as_u64)
}

fn action(payload: &Value) -> String {
    text(payload, "/action").unwrap_or_default()
}

/// Map a raw payload onto the variant for `kind`.
pub fn to_payload(kind: &EventKind, payload: &Value) -> Payload {
    match kind {
        EventKind::Push => {
            let commit_list = payload.pointer("/commits").and_then(Value::as_array);
            let messages = commit_list
                .map(|commits| {
                    commits
                        .iter()
                        .filter_map(|c| c.get("message").and_then(Value::as_str))
                        .map(|m| m.lines().next().unwrap_or_default().to_string())
                        .collect()
                })
                .unwrap_or_default();
            let commits = number(payload, "/size")
                .or_else(|| commit_list.map(|c| c.len() as u64))
                .unwrap_or(0);
            Payload::Push {
                commits,
                git_ref: text(payload, "/ref"),
                head: text(payload, "/head"),
                messages,
            }
        }
        EventKind::PullRequest => Payload::PullRequest {
            action: action(payload),
            number: number(payload, "/number")
                .or_else(|| number(payload, "/pull_request/number"))
                .unwrap_or(0),
            title: text(payload, "/pull_request/title"),
        },
        EventKind::PullRequestReview => Payload::PullRequestReview {
            action: action(payload),
            number: number(payload, "/pull_request/number").unwrap_or(0),
        },
        EventKind::PullRequestReviewComment => Payload::PullRequestReviewComment {
            action: action(payload),
            number: number(payload, "/pull_request/number").unwrap_or(0),
        },
        EventKind::Issues => Payload::Issues {
            action: action(payload),
            number: number(payload, "/issue/number").unwrap_or(0),
            title: text(payload, "/issue/title"),
        },
        EventKind::IssueComment => Payload::IssueComment {
            action: action(payload),
            number: number(payload, "/issue/number").unwrap_or(0),
        },
        EventKind::Create => Payload::Create {
            ref_type: text(payload, "/ref_type").unwrap_or_default(),
            git_ref: text(payload, "/ref"),
        },
        EventKind::Delete => Payload::Delete {
            ref_type: text(payload, "/ref_type").unwrap_or_default(),
            git_ref: text(payload, "/ref"),
        },
        EventKind::Fork => Payload::Fork {
            forkee: text(payload, "/forkee/full_name"),
        },
        EventKind::Watch => Payload::Watch {
            action: action(payload),
        },
        EventKind::Release => Payload::Release {
            action: action(payload),
            tag: text(payload, "/release/tag_name"),
        },
        EventKind::Member => Payload::Member {
            action: action(payload),
            member: text(payload, "/member/login"),
        },
        EventKind::Gollum => Payload::Gollum {
            pages: payload
                .pointer("/pages")
                .and_then(Value::as_array)
                .map(|p| p.len() as u64)
                .unwrap_or(0),
        },
        EventKind::CommitComment => Payload::CommitComment {
            commit_id: text(payload, "/comment/commit_id"),
        },
        EventKind::Public => Payload::Public,
        EventKind::Other(_) => Payload::Other {
            fields: payload.as_object().cloned().unwrap_or_default(),
        },
    }
}

/// Normalize a raw event. Returns `None` when the repository name is not `owner/name`.
pub fn to_event_record(raw: RawEvent) -> Option<EventRecord> {
    let repo: RepoId = raw.repo.name.parse().ok()?;
    let kind = raw
        .event_type
        .as_deref()
        .map(EventKind::parse)
        .unwrap_or_else(|| EventKind::Other("UnknownEvent".to_string()));
    let payload = to_payload(&kind, &raw.payload);

    Some(EventRecord {
        id: raw.id,
        kind,
        actor: raw.actor.login,
        repo,
        created_at: raw.created_at,
        payload,
        repo_details: None,
    })
}

/// Convert a repository response into enrichment data for `repo`.
///
/// The details stay keyed by the requested id even when GitHub answers for a renamed repository.
pub fn to_enrichment(repo: &RepoId, raw: RawRepository) -> RepositoryEnrichment {
    RepositoryEnrichment {
        repo: repo.clone(),
        stars: raw.stargazers_count,
        forks: raw.forks_count,
        description: raw.description,
        language: raw.language,
        html_url: raw.html_url,
    }
}
