//! Core business logic for the retriever.
//!
//! # Modules
//!
//! - [`fetch`] - Per-source retrieval strategies and response extraction
//! - [`matching`] - Fuzzy entity matching
//! - [`postprocess`] - Named metadata transforms
//! - [`mapper`] - Entity-to-dataset link construction for one source
//! - [`dispatch`] - Run orchestration across all sources
//! - [`notify`] - Run notifications
//!
//! # Pipeline
//!
//! 1. **Fetch**: Every configured source is fetched, sequentially or with a
//!    bounded worker pool
//! 2. **Resolve entities**: Records of the entity source become the entities
//! 3. **Match**: Each other source's groups are fuzzy-matched against every
//!    entity id
//! 4. **Post-process**: Matched groups go through the source's transform
//! 5. **Report**: Mappings are returned with a run summary
//!
//! # Example
//!
//! ```rust,no_run
//! use data_retriever::config::load_config;
//! use data_retriever::core::dispatch::{Dispatcher, FetchMode};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("retriever.toml")?;
//!
//! let dispatcher = Dispatcher::from_config(&config)?;
//! let summary = dispatcher.run(&config, FetchMode::Parallel { workers: 8 }).await?;
//!
//! println!("Entities: {}", summary.entity_count);
//! println!("Mappings: {}", summary.mappings.len());
//! println!("Links: {}", summary.link_count);
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod fetch;
pub mod mapper;
pub mod matching;
pub mod notify;
pub mod postprocess;
