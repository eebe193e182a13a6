// Activity pipeline.
// Cache lookup, fetch on miss, filtering, and optional repository enrichment.

pub mod enrich;
pub mod orchestrator;
pub mod source;

pub use orchestrator::{
    DEFAULT_ENRICH_CONCURRENCY, DEFAULT_MAX_EVENTS, Pipeline, PipelineOptions, PipelineResult,
};
pub use source::{ActivitySource, EnrichmentSource};
