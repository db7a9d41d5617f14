//! Configuration management for the retriever.
//!
//! TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The retriever uses one TOML file describing the project, the entity
//! source and every secondary source, with support for:
//! - Environment variable substitution (`${VAR_NAME}`, `${VAR_NAME:-fallback}`)
//! - `RETRIEVER_*` environment overrides
//! - Default values for optional settings
//! - Validation of every source block before any request is made
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use data_retriever::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("retriever.toml")?;
//!
//! println!("Project: {}", config.project);
//! for source in &config.sources {
//!     println!("{} ({})", source.name, source.kind);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! project = "ICDC"
//! entity_source = "icdc"
//!
//! [fetch]
//! parallel = true
//! max_workers = 8
//!
//! [[sources]]
//! name = "icdc"
//! kind = "query"
//! api_base_url = "https://caninecommons.cancer.gov"
//! endpoint = "/v1/graphql/"
//! query = "{ studiesByProgram { clinical_study_designation } }"
//! response_data_key = "data.studiesByProgram"
//! entity_id_key = "clinical_study_designation"
//!
//! [[sources]]
//! name = "TCIA"
//! kind = "discovery"
//! api_base_url = "https://services.cancerimagingarchive.net/nbia-api/services/v1"
//! entity_id_key = "clinical_study_designation"
//! dataset_base_url = "https://www.cancerimagingarchive.net/collection/{collection_id}"
//! dataset_base_url_param = "collection_id"
//! post_processor = "aggregate_tcia_series_data"
//!
//! [sources.discovery]
//! endpoint = "/getCollectionValues"
//! match_key = "Collection"
//! filter_prefix = "ICDC-"
//!
//! [sources.fetch]
//! endpoint_template = "/getSeries?Collection={collection_id}"
//! key_param = "collection_id"
//!
//! [output]
//! host = "${OPENSEARCH_HOST:-https://localhost:9200}"
//! index = "crdc-dataset-links"
//! ```
//!
//! Credentials are never read from the file by default: set
//! `OPENSEARCH_USERNAME` and `OPENSEARCH_PASSWORD` in the environment.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_from_str};
pub use schema::{
    ApplicationConfig, DiscoveryConfig, FetchConfig, FetchKind, FetchTemplateConfig,
    LoggingConfig, MatchingConfig, NotificationsConfig, OutputConfig, RetrieverConfig,
    SourceConfig,
};
pub use secret::{secret_from_env, secret_string, SecretString, SecretValue};
