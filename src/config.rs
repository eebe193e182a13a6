//! Configuration file support for gh-activity.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `GH_ACTIVITY_`, nested keys joined
//!    with `__`, e.g. `GH_ACTIVITY_GITHUB__TOKEN`), plus `GITHUB_TOKEN`
//! 3. Config file (~/.config/gh-activity/config.toml or ./gh-activity.toml)
//! 4. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."            # or GITHUB_TOKEN
//! api_url = "https://api.github.com"
//! timeout_secs = 15
//!
//! [fetch]
//! max_events = 100
//! per_page = 100
//! retries = 2
//!
//! [cache]
//! dir = "/tmp/gh-activity"    # defaults to the platform cache dir
//!
//! [enrich]
//! concurrency = 4
//! ```

use std::path::PathBuf;
use std::time::Duration;

use config::{Config as ConfigBuilder, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::Deserialize;

use crate::github::{ClientOptions, GITHUB_API_BASE};
use crate::pipeline::{DEFAULT_ENRICH_CONCURRENCY, DEFAULT_MAX_EVENTS};

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github: GitHubConfig,
    pub fetch: FetchConfig,
    pub cache: CacheConfig,
    pub enrich: EnrichConfig,
}

/// GitHub connection settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Personal access token. Optional; without it the lower anonymous limit applies.
    pub token: Option<String>,
    pub api_url: String,
    pub timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: GITHUB_API_BASE.to_string(),
            timeout_secs: 15,
            user_agent: None,
        }
    }
}

/// Events feed paging.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound on events pulled from the feed (the API serves at most 300).
    pub max_events: usize,
    pub per_page: usize,
    /// Extra attempts after a transient failure.
    pub retries: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            max_events: DEFAULT_MAX_EVENTS,
            per_page: 100,
            retries: 2,
        }
    }
}

/// Cache location.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub dir: Option<PathBuf>,
}

/// Enrichment settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EnrichConfig {
    pub concurrency: usize,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from files and the environment.
    ///
    /// Unreadable configuration is logged and replaced by defaults.
    pub fn load() -> Self {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = Self::default_config_path()
            && path.exists()
        {
            tracing::debug!("Loading config from {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(false));
        }

        let local_config = PathBuf::from("gh-activity.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./gh-activity.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("GH_ACTIVITY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        match builder.build().and_then(|c| c.try_deserialize::<Config>()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {}", e);
                Config::default()
            }
        }
    }

    /// Parse configuration from TOML text alone.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        ConfigBuilder::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "gh-activity").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Token from the flag, then config/`GH_ACTIVITY_GITHUB__TOKEN`, then `GITHUB_TOKEN`.
    pub fn github_token(&self, flag: Option<&str>) -> Option<String> {
        flag.map(String::from)
            .or_else(|| self.github.token.clone())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
            .filter(|t| !t.trim().is_empty())
    }

    pub fn client_options(&self, token: Option<String>) -> ClientOptions {
        let defaults = ClientOptions::default();
        ClientOptions {
            api_url: self.github.api_url.clone(),
            token,
            timeout: Duration::from_secs(self.github.timeout_secs.max(1)),
            user_agent: self
                .github
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
            retries: self.fetch.retries,
            per_page: self.fetch.per_page,
        }
    }
}
