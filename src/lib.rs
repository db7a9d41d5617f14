// Data Retriever - CRDC dataset link retrieval service
// Copyright (c) 2025 Data Retriever Contributors
// Licensed under the MIT License

//! # Data Retriever
//!
//! Data Retriever links the study entities of one data source to matching
//! datasets held by other repositories, and stores the resulting link
//! documents in OpenSearch.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Fetching** records from heterogeneous REST and query APIs
//! - **Matching** entity identifiers against dataset identifiers with a
//!   fuzzy partial-ratio score
//! - **Transforming** matched metadata with named post-processors
//! - **Loading** one link document per entity into OpenSearch
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (fetch, match, post-process, dispatch)
//! - [`adapters`] - External integrations (HTTP sources, OpenSearch)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use data_retriever::config::load_config;
//! use data_retriever::core::dispatch::dispatch;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("retriever.toml")?;
//!
//!     let mappings = dispatch(&config, false).await?;
//!
//!     for mapping in &mappings {
//!         println!("{}: {} links", mapping.entity_id, mapping.link_count());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Matching
//!
//! An entity id and a candidate dataset id match when their case-insensitive
//! partial-ratio similarity reaches the configured threshold (75 by default):
//!
//! ```
//! use data_retriever::core::matching::FuzzyMatcher;
//!
//! let matcher = FuzzyMatcher::default();
//! assert!(matcher.is_match("GLIOMA01", "icdc_glioma"));
//! assert!(!matcher.is_match("GLIOMA01", "tcga_brca"));
//! ```
//!
//! ## Error Handling
//!
//! The library uses [`domain::RetrieverError`] for all errors. Per-source
//! fetch failures never abort a run; they are logged and the source is left
//! out of the result.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
