//! gh-activity: fetch, cache, filter and enrich a GitHub user's public activity.
//!
//! The [`pipeline::Pipeline`] is the entry point. It serves from a short-lived
//! local cache when possible, otherwise fetches the user's event feed, then
//! filters and optionally enriches the events with repository metadata.

pub mod activity;
pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod pipeline;
pub mod render;

pub use activity::{EventFilter, EventKind, EventRecord, RepoId, RepositoryEnrichment};
pub use error::{ActivityError, ErrorKind, Result};
pub use pipeline::{Pipeline, PipelineOptions, PipelineResult};
