//! Dispatcher - orchestrates fetch and match phases for a run

use super::summary::{DispatchSummary, RunState};
use crate::adapters::http::{JsonHttpClient, ReqwestJsonClient};
use crate::config::{RetrieverConfig, SourceConfig};
use crate::core::fetch::SourceFetcher;
use crate::core::mapper::Mapper;
use crate::core::matching::FuzzyMatcher;
use crate::core::postprocess::PostProcessorRegistry;
use crate::domain::{Dataset, Entity, Result, RetrieverError};
use crate::log_error_with_context;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Default width of the parallel fetch pool
pub const DEFAULT_MAX_WORKERS: usize = 8;

/// How sources are fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// One source after another, in configuration order
    Sequential,
    /// Up to `workers` sources in flight at once
    Parallel {
        /// Pool width
        workers: usize,
    },
}

impl FetchMode {
    /// Mode for a `--parallel-fetch` style flag
    pub fn from_flag(parallel: bool, workers: usize) -> Self {
        if parallel {
            FetchMode::Parallel {
                workers: workers.max(1),
            }
        } else {
            FetchMode::Sequential
        }
    }
}

/// Data fetched for a run, keyed by source name
#[derive(Debug, Default)]
pub struct FetchedSources {
    datasets: HashMap<String, Dataset>,
    failed: Vec<String>,
}

impl FetchedSources {
    /// Dataset of a successfully fetched source
    pub fn get(&self, name: &str) -> Option<&Dataset> {
        self.datasets.get(name)
    }

    /// Names of sources whose fetch failed, sorted
    pub fn failed(&self) -> &[String] {
        &self.failed
    }

    fn record(&mut self, name: String, outcome: Result<Dataset>) {
        match outcome {
            Ok(dataset) => {
                self.datasets.insert(name, dataset);
            }
            Err(e) => {
                log_error_with_context!(e, format!("Failed to fetch data from source: {name}"));
                self.failed.push(name);
            }
        }
    }
}

/// Runs the fetch-match pipeline
pub struct Dispatcher {
    fetcher: SourceFetcher,
    registry: PostProcessorRegistry,
    matcher: FuzzyMatcher,
}

impl Dispatcher {
    /// Create a dispatcher over an HTTP client with the built-in post-processors
    pub fn new(client: Arc<dyn JsonHttpClient>) -> Self {
        Self {
            fetcher: SourceFetcher::new(client),
            registry: PostProcessorRegistry::builtin(),
            matcher: FuzzyMatcher::default(),
        }
    }

    /// Create a dispatcher with the configured timeouts and threshold
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &RetrieverConfig) -> Result<Self> {
        let client = ReqwestJsonClient::new(&config.fetch)?;
        Ok(Self::new(Arc::new(client)).with_matcher(FuzzyMatcher::new(config.matching.threshold)))
    }

    /// Replace the post-processor registry
    pub fn with_registry(mut self, registry: PostProcessorRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the matcher
    pub fn with_matcher(mut self, matcher: FuzzyMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// Fetch every source sequentially, in configuration order
    ///
    /// A failed source is logged and left out; the others still run.
    pub async fn fetch_all(&self, sources: &[SourceConfig]) -> FetchedSources {
        let mut fetched = FetchedSources::default();
        for source in sources {
            let outcome = self.fetcher.fetch(source).await;
            fetched.record(source.name.clone(), outcome);
        }
        fetched
    }

    /// Fetch sources with at most `workers` in flight
    ///
    /// Each task yields its own outcome; the name-keyed map is assembled once
    /// all tasks have finished, so completion order does not matter.
    pub async fn fetch_all_parallel(
        &self,
        sources: &[SourceConfig],
        workers: usize,
    ) -> FetchedSources {
        let fetcher = &self.fetcher;
        let outcomes: Vec<(String, Result<Dataset>)> = stream::iter(sources)
            .map(|source| async move { (source.name.clone(), fetcher.fetch(source).await) })
            .buffer_unordered(workers.max(1))
            .collect()
            .await;

        let mut fetched = FetchedSources::default();
        for (name, outcome) in outcomes {
            fetched.record(name, outcome);
        }
        fetched.failed.sort();
        fetched
    }

    /// Run the pipeline and report on it
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the sources list is malformed or the
    /// entity source cannot be resolved. Fetch and mapping failures of single
    /// sources are logged and counted, never returned.
    pub async fn run(&self, config: &RetrieverConfig, mode: FetchMode) -> Result<DispatchSummary> {
        let start = Instant::now();
        let mut summary = DispatchSummary::new(config.sources.len());

        let entity_source = config
            .entity_source_config()
            .map_err(RetrieverError::Configuration)?;

        summary.transition(RunState::Fetching);
        tracing::info!(sources = config.sources.len(), mode = ?mode, "Fetching sources");

        let fetched = match mode {
            FetchMode::Sequential => self.fetch_all(&config.sources).await,
            FetchMode::Parallel { workers } => {
                self.fetch_all_parallel(&config.sources, workers).await
            }
        };
        summary.sources_failed = fetched.failed().len();

        let entities: Vec<Entity> = fetched
            .get(&entity_source.name)
            .map(Dataset::entities)
            .unwrap_or_default();
        summary.entity_count = entities.len();

        if entities.is_empty() {
            tracing::warn!(
                entity_source = %entity_source.name,
                "Entity source returned no entities, nothing to match"
            );
            summary.transition(RunState::EarlyExit);
            summary.transition(RunState::Done);
            return Ok(summary.with_duration(start.elapsed()));
        }

        summary.transition(RunState::Matching);
        self.match_all(config, &entities, &fetched, &mut summary);
        summary.transition(RunState::Done);

        Ok(summary.with_duration(start.elapsed()))
    }

    fn match_all(
        &self,
        config: &RetrieverConfig,
        entities: &[Entity],
        fetched: &FetchedSources,
        summary: &mut DispatchSummary,
    ) {
        for source in config.sources.iter().filter(|s| s.name != config.entity_source) {
            let Some(dataset) = fetched.get(&source.name).filter(|d| !d.is_empty()) else {
                tracing::warn!(source = %source.name, "No data for source, skipping match");
                continue;
            };

            let mapped = Mapper::for_source(source, &self.registry, self.matcher)
                .and_then(|mapper| mapper.collect_mappings(entities, dataset));

            match mapped {
                Ok(mappings) => {
                    tracing::info!(
                        source = %source.name,
                        mappings = mappings.len(),
                        "Matched source against entities"
                    );
                    summary.add_mappings(mappings);
                }
                Err(e) => {
                    log_error_with_context!(e, format!("Failed to map source: {}", source.name));
                    summary.sources_failed += 1;
                }
            }
        }
    }
}
