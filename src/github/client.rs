// GitHub API HTTP client.
// Handles optional authentication, timeouts, bounded retries, and response classification.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::Utc;
use reqwest::{
    Client, Response, StatusCode, Url,
    header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT},
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ActivityError, Result};

use super::rate_limit::{RateLimitInfo, RateLimitTracker};

pub const GITHUB_API_BASE: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
const DEFAULT_USER_AGENT: &str = concat!("gh-activity/", env!("CARGO_PKG_VERSION"));

/// Connection settings for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    pub user_agent: String,
    /// Extra attempts after a transient failure.
    pub retries: usize,
    pub per_page: usize,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_url: GITHUB_API_BASE.to_string(),
            token: None,
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            retries: 2,
            per_page: 100,
        }
    }
}

/// GitHub API client. Works unauthenticated when no token is given.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    api_url: Url,
    retries: usize,
    per_page: usize,
}

impl GitHubClient {
    pub fn new(options: &ClientOptions) -> Result<Self> {
        let mut headers = HeaderMap::new();

        if let Some(token) = options.token.as_deref().filter(|t| !t.trim().is_empty()) {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                    .map_err(|e| ActivityError::Config(format!("invalid token: {}", e)))?,
            );
        }
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&options.user_agent)
                .map_err(|e| ActivityError::Config(format!("invalid user agent: {}", e)))?,
        );

        let api_url = Url::parse(&options.api_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| ActivityError::Config(format!("invalid API URL: {}", options.api_url)))?;

        let client = Client::builder()
            .default_headers(headers)
            .timeout(options.timeout)
            .build()?;

        Ok(Self {
            client,
            api_url,
            retries: options.retries,
            per_page: options.per_page.clamp(1, 100),
        })
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Join percent-encoded path segments onto the API base URL.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ActivityError::Config(format!("invalid API URL: {}", self.api_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.retries)
            .with_jitter()
    }

    /// GET the endpoint at `segments`, retrying transient failures.
    ///
    /// `resource` names what a 404 means, e.g. "user 'octocat'".
    pub async fn get_with_params<T: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        params: &T,
        resource: &str,
        tracker: &RateLimitTracker,
    ) -> Result<Response> {
        let url = self.url(segments)?;
        let attempt = || self.send_once(url.clone(), params, resource, tracker);

        attempt
            .retry(self.backoff())
            .when(|e: &ActivityError| e.is_transient())
            .notify(|err: &ActivityError, dur: Duration| {
                warn!(url = %url, error = %err, retry_in = ?dur, "Transient API failure, retrying");
            })
            .await
    }

    async fn send_once<T: Serialize + ?Sized>(
        &self,
        url: Url,
        params: &T,
        resource: &str,
        tracker: &RateLimitTracker,
    ) -> Result<Response> {
        let response = self.client.get(url).query(params).send().await?;

        let rate_limit = RateLimitInfo::from_headers(response.headers());
        if let Some(info) = rate_limit {
            debug!(
                limit = info.limit,
                remaining = info.remaining,
                reset_at = %info.reset_at,
                "Rate limit updated"
            );
            tracker.record(info);
        }

        self.check_response(response, rate_limit, resource).await
    }

    /// Check response status and convert errors.
    async fn check_response(
        &self,
        response: Response,
        rate_limit: Option<RateLimitInfo>,
        resource: &str,
    ) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, rate_limit.as_ref(), resource, body))
    }
}

/// Classify a non-success status.
pub(crate) fn status_error(
    status: StatusCode,
    rate_limit: Option<&RateLimitInfo>,
    resource: &str,
    body: String,
) -> ActivityError {
    match status {
        StatusCode::UNAUTHORIZED => ActivityError::Unauthorized,
        StatusCode::NOT_FOUND => ActivityError::NotFound(resource.to_string()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => match rate_limit {
            Some(info) if info.is_exhausted() => ActivityError::RateLimited {
                reset_at: info.reset_at,
            },
            None if status == StatusCode::TOO_MANY_REQUESTS => ActivityError::RateLimited {
                reset_at: Utc::now() + chrono::Duration::seconds(60),
            },
            _ => ActivityError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            },
        },
        _ => ActivityError::UnexpectedStatus {
            status: status.as_u16(),
            body,
        },
    }
}
