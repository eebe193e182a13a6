// GitHub API module.
// Provides the client, raw types, and conversion into the activity model.

pub mod client;
pub mod convert;
pub mod endpoints;
pub mod rate_limit;
pub mod types;

pub use client::{ClientOptions, GITHUB_API_BASE, GitHubClient};
pub use rate_limit::{RateLimitInfo, RateLimitTracker};
pub use types::*;
