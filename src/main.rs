// gh-activity command-line entry point.
// Parses arguments, wires the pipeline to GitHub and the cache, and prints results.

use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use gh_activity::cache::{CacheStore, FileBackend, MemoryBackend};
use gh_activity::config::Config;
use gh_activity::github::{GitHubClient, RateLimitTracker};
use gh_activity::render::{OutputFormat, quota_line, render};
use gh_activity::{ActivityError, ErrorKind, EventFilter, Pipeline, PipelineOptions, RepoId};

#[derive(Parser)]
#[command(name = "gh-activity")]
#[command(version)]
#[command(about = "Show a GitHub user's recent public activity")]
#[command(after_long_help = r#"EXAMPLES
    Recent activity:
        $ gh-activity torvalds

    Only pushes, as a table:
        $ gh-activity torvalds --types PushEvent -f table

    Activity in one repository, with star counts:
        $ gh-activity octocat --repos octocat/Hello-World --enrich

CONFIGURATION
    ~/.config/gh-activity/config.toml, ./gh-activity.toml, and GH_ACTIVITY_*
    environment variables (e.g. GH_ACTIVITY_FETCH__MAX_EVENTS=300).
    The token may also come from GITHUB_TOKEN.

EXIT STATUS
    0 success, 2 user not found, 3 bad token, 4 rate limited,
    5 network failure, 1 anything else
"#)]
struct Cli {
    /// GitHub username
    username: String,

    /// Number of events to display
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// GitHub personal access token (falls back to config and GITHUB_TOKEN)
    #[arg(short, long)]
    token: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Only show these event types (e.g. PushEvent IssuesEvent, or push issues)
    #[arg(long, num_args = 1..)]
    types: Vec<String>,

    /// Only show events in these repositories (owner/name)
    #[arg(long, num_args = 1..)]
    repos: Vec<RepoId>,

    /// Skip the local cache for this run
    #[arg(long)]
    no_cache: bool,

    /// Remove the cached activity for this user before running
    #[arg(long)]
    clear_cache: bool,

    /// Colorize text output
    #[arg(long)]
    color: bool,

    /// Add repository stars, forks and description
    #[arg(long)]
    enrich: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn default_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_cache(config: &Config, no_cache: bool) -> CacheStore {
    let store = match &config.cache.dir {
        Some(dir) => CacheStore::new(FileBackend::new(dir)),
        None => match FileBackend::from_default_dir() {
            Ok(backend) => {
                tracing::debug!(dir = %backend.base().display(), "Using cache directory");
                CacheStore::new(backend)
            }
            Err(e) => {
                tracing::warn!("{}; caching in memory for this run", e);
                CacheStore::new(MemoryBackend::new())
            }
        },
    };

    if no_cache { store.bypass() } else { store }
}

fn exit_code(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::NotFound => ExitCode::from(2),
        ErrorKind::Auth => ExitCode::from(3),
        ErrorKind::RateLimited => ExitCode::from(4),
        ErrorKind::Network => ExitCode::from(5),
        _ => ExitCode::FAILURE,
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let token = config.github_token(cli.token.as_deref());
    if token.is_none() {
        tracing::info!("No token configured, using the unauthenticated rate limit");
    }

    let client = Arc::new(GitHubClient::new(&config.client_options(token))?);
    let pipeline = Pipeline::new(client.clone(), client, open_cache(&config, cli.no_cache))
        .with_max_events(config.fetch.max_events)
        .with_enrich_concurrency(config.enrich.concurrency);

    if cli.clear_cache
        && let Err(e) = pipeline.clear_cache(&cli.username)
    {
        eprintln!("warning: could not clear cache: {}", e);
    }

    let options = PipelineOptions {
        filter: EventFilter::new(cli.types.as_slice(), cli.repos),
        limit: Some(cli.limit),
        enrich: cli.enrich,
    };

    let tracker = Arc::new(RateLimitTracker::new());
    let result = pipeline.run(&cli.username, &options, &tracker).await;

    if let Some(quota) = tracker.latest() {
        eprintln!("{}", quota_line(&quota));
    }

    let result = result?;
    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }

    println!("{}", render(&result.events, cli.format, cli.color)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            match e.downcast_ref::<ActivityError>() {
                Some(err) => {
                    if let Some(hint) = err.hint() {
                        eprintln!("hint: {}", hint);
                    }
                    exit_code(err.kind())
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}
