//! Pipeline orchestration
//!
//! The dispatcher fetches every configured source, resolves the entities from
//! the entity source, and maps every other source against them.
//!
//! ```text
//! INIT -> FETCHING -> EARLY_EXIT -> DONE
//!                  \-> MATCHING  -> DONE
//! ```

pub mod coordinator;
pub mod summary;

pub use coordinator::{Dispatcher, FetchMode, FetchedSources, DEFAULT_MAX_WORKERS};
pub use summary::{DispatchSummary, RunState};

use crate::config::RetrieverConfig;
use crate::domain::{EntityMapping, Result};

/// Run the fetch-match pipeline for a configuration
///
/// `parallel_fetch` selects bounded-parallel fetching with
/// `fetch.max_workers` workers; otherwise sources are fetched in order.
///
/// # Errors
///
/// Returns an error if the sources list is malformed or the entity source is
/// not configured. Per-source failures only reduce the result.
///
/// # Example
///
/// ```rust,no_run
/// use data_retriever::config::load_config;
/// use data_retriever::core::dispatch::dispatch;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config("retriever.toml")?;
/// let mappings = dispatch(&config, true).await?;
/// println!("{} entities linked", mappings.len());
/// # Ok(())
/// # }
/// ```
pub async fn dispatch(
    config: &RetrieverConfig,
    parallel_fetch: bool,
) -> Result<Vec<EntityMapping>> {
    let summary = dispatch_with_summary(config, parallel_fetch).await?;
    Ok(summary.mappings)
}

/// Same as [`dispatch`] but returns the whole run summary
///
/// # Errors
///
/// See [`dispatch`].
pub async fn dispatch_with_summary(
    config: &RetrieverConfig,
    parallel_fetch: bool,
) -> Result<DispatchSummary> {
    let mode = FetchMode::from_flag(parallel_fetch, config.fetch.max_workers);
    let summary = Dispatcher::from_config(config)?.run(config, mode).await?;
    summary.log_summary();
    Ok(summary)
}
