// Output rendering for pipeline results.
// Text and table for terminals, JSON and YAML for scripts.

use crossterm::style::{Color, Stylize};
use tabled::settings::Style;
use tabled::{Table, Tabled};
use thiserror::Error;

use crate::activity::{EventKind, EventRecord};
use crate::github::RateLimitInfo;

/// Output format selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One line per event (default)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
    /// Formatted table
    Table,
}

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Render events in the chosen format.
pub fn render(
    events: &[EventRecord],
    format: OutputFormat,
    color: bool,
) -> Result<String, RenderError> {
    match format {
        OutputFormat::Text => Ok(render_text(events, color)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(events)?),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(events)?),
        OutputFormat::Table => Ok(render_table(events)),
    }
}

/// One-line quota status, reset time shown in local time.
pub fn quota_line(quota: &RateLimitInfo) -> String {
    format!(
        "rate limit: {}/{} remaining, resets at {}",
        quota.remaining,
        quota.limit,
        quota
            .reset_at
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S")
    )
}

fn kind_color(kind: &EventKind) -> Option<Color> {
    match kind {
        EventKind::Push => Some(Color::Green),
        EventKind::PullRequest
        | EventKind::PullRequestReview
        | EventKind::PullRequestReviewComment => Some(Color::Blue),
        EventKind::Issues | EventKind::IssueComment => Some(Color::Yellow),
        EventKind::Watch => Some(Color::Magenta),
        EventKind::Create | EventKind::Fork | EventKind::Release => Some(Color::Cyan),
        EventKind::Delete => Some(Color::Red),
        _ => None,
    }
}

fn details_suffix(event: &EventRecord) -> String {
    match &event.repo_details {
        Some(details) => format!(" ({} stars, {} forks)", details.stars, details.forks),
        None => String::new(),
    }
}

fn render_text(events: &[EventRecord], color: bool) -> String {
    if events.is_empty() {
        return "No activity found.".to_string();
    }

    events
        .iter()
        .map(|event| {
            let line = format!(
                "- {} {}{}",
                event.created_at.format("%Y-%m-%d %H:%M"),
                event.summary(),
                details_suffix(event)
            );
            match kind_color(&event.kind) {
                Some(c) if color => line.with(c).to_string(),
                _ => line,
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Tabled)]
struct EventRow {
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Repository")]
    repo: String,
    #[tabled(rename = "Details")]
    details: String,
    #[tabled(rename = "Stars")]
    stars: String,
}

impl From<&EventRecord> for EventRow {
    fn from(event: &EventRecord) -> Self {
        Self {
            date: event.created_at.format("%Y-%m-%d %H:%M").to_string(),
            kind: event.kind.to_string(),
            repo: event.repo.to_string(),
            details: event.summary(),
            stars: event
                .repo_details
                .as_ref()
                .map(|d| d.stars.to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

fn render_table(events: &[EventRecord]) -> String {
    let rows: Vec<EventRow> = events.iter().map(EventRow::from).collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}
