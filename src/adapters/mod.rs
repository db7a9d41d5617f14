//! External system integrations for the retriever.
//!
//! - [`http`] - JSON-over-HTTP client used to query source APIs
//! - [`opensearch`] - OpenSearch sink for entity mappings
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind traits
//! ([`http::JsonHttpClient`], [`opensearch::MappingSink`]) so the core can be
//! tested against mock servers or fakes.
//!
//! ```rust,no_run
//! use data_retriever::adapters::http::{JsonHttpClient, ReqwestJsonClient};
//! use data_retriever::config::FetchConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReqwestJsonClient::new(&FetchConfig::default())?;
//! let collections = client.get_json("https://api.example.org/collections").await?;
//! println!("{collections}");
//! # Ok(())
//! # }
//! ```

pub mod http;
pub mod opensearch;
