//! Source fetch strategies
//!
//! One [`SourceFetcher`] serves every source of a run. The source's
//! [`FetchKind`] selects the strategy:
//!
//! - `direct`: one GET of `api_base_url + endpoint`, optionally filtered by prefix
//! - `discovery`: a listing GET, then one follow-up GET per discovered match
//! - `query`: one POST of `{"query": ...}` to `api_base_url + endpoint`

use super::extract::extract_response_data;
use super::template::render_template;
use crate::adapters::http::JsonHttpClient;
use crate::config::{DiscoveryConfig, FetchKind, FetchTemplateConfig, SourceConfig};
use crate::domain::{match_value, Dataset, FetchError, Group, Result};
use crate::{log_fetch_complete, log_fetch_start};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

/// Retrieves and normalizes data for configured sources
#[derive(Clone)]
pub struct SourceFetcher {
    client: Arc<dyn JsonHttpClient>,
}

impl SourceFetcher {
    /// Create a fetcher over an HTTP client
    pub fn new(client: Arc<dyn JsonHttpClient>) -> Self {
        Self { client }
    }

    /// Fetch one source and normalize the payload into a [`Dataset`]
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, non-success status, malformed
    /// body, or a source configuration its kind cannot be fetched with.
    /// Failed follow-up requests of a discovery source do not fail the source.
    pub async fn fetch(&self, source: &SourceConfig) -> Result<Dataset> {
        let start = Instant::now();
        log_fetch_start!(source.name, source.kind);

        let dataset = match source.kind {
            FetchKind::Direct => self.fetch_direct(source).await?,
            FetchKind::Discovery => self.fetch_discovery(source).await?,
            FetchKind::Query => self.fetch_query(source).await?,
        };

        if dataset.is_empty() {
            tracing::warn!(source = %source.name, "No data returned from source");
        }
        log_fetch_complete!(
            source.name,
            dataset.group_count(),
            dataset.record_count(),
            start.elapsed()
        );
        Ok(dataset)
    }

    async fn fetch_direct(&self, source: &SourceConfig) -> Result<Dataset> {
        let endpoint = required(source, "endpoint", &source.endpoint)?;
        let url = join_url(&source.api_base_url, endpoint);
        let response = self.client.get_json(&url).await?;
        let mut payload = extract_response_data(source.response_data_key.as_deref(), response);

        if let (Some(prefix), Some(match_key), Value::Array(items)) = (
            source.filter_prefix.as_deref(),
            source.match_key.as_deref(),
            &mut payload,
        ) {
            let before = items.len();
            items.retain(|item| has_prefix(item, match_key, prefix));
            tracing::debug!(
                source = %source.name,
                kept = items.len(),
                dropped = before - items.len(),
                prefix = %prefix,
                "Applied prefix filter"
            );
        }

        Ok(Dataset::from_value(payload))
    }

    async fn fetch_discovery(&self, source: &SourceConfig) -> Result<Dataset> {
        let discovery: &DiscoveryConfig = required(source, "discovery", &source.discovery)?;
        let fetch: &FetchTemplateConfig = required(source, "fetch", &source.fetch)?;

        let discovery_url = join_url(&source.api_base_url, &discovery.endpoint);
        let response = self.client.get_json(&discovery_url).await?;
        let listing = extract_response_data(source.response_data_key.as_deref(), response);

        let matches: Vec<String> = match &listing {
            Value::Array(items) => items
                .iter()
                .filter(|item| has_prefix(item, &discovery.match_key, &discovery.filter_prefix))
                .filter_map(|item| item.get(&discovery.match_key).and_then(match_value))
                .collect(),
            _ => {
                tracing::warn!(source = %source.name, "Discovery response is not a list");
                Vec::new()
            }
        };

        tracing::debug!(
            source = %source.name,
            matches = matches.len(),
            "Discovery phase complete"
        );

        // Follow-ups stay sequential so groups keep discovery order
        let mut groups = Vec::with_capacity(matches.len());
        for matched in &matches {
            let endpoint = render_template(&fetch.endpoint_template, &fetch.key_param, matched)?;
            let url = join_url(&source.api_base_url, &endpoint);

            match self.client.get_json(&url).await {
                Ok(response) => {
                    let payload =
                        extract_response_data(source.response_data_key.as_deref(), response);
                    groups.push(Group::from_value(payload));
                }
                Err(e) => {
                    tracing::warn!(
                        source = %source.name,
                        matched = %matched,
                        error = %e,
                        "Follow-up fetch failed, recording empty group"
                    );
                    groups.push(Group::default());
                }
            }
        }

        Ok(Dataset::from_groups(groups))
    }

    async fn fetch_query(&self, source: &SourceConfig) -> Result<Dataset> {
        let endpoint = required(source, "endpoint", &source.endpoint)?;
        let url = join_url(&source.api_base_url, endpoint);
        let query = required(source, "query", &source.query)?;

        let response = self.client.post_json(&url, &json!({ "query": query })).await?;
        let payload = extract_response_data(source.response_data_key.as_deref(), response);
        Ok(Dataset::from_value(payload))
    }
}

fn required<'a, T>(source: &SourceConfig, field: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| {
        FetchError::MissingField {
            source_name: source.name.clone(),
            field: field.to_string(),
        }
        .into()
    })
}

/// Case-sensitive starts-with on the record's match value
fn has_prefix(item: &Value, match_key: &str, prefix: &str) -> bool {
    item.get(match_key)
        .and_then(match_value)
        .is_some_and(|value| value.starts_with(prefix))
}

fn join_url(base: &str, endpoint: &str) -> String {
    format!("{base}{endpoint}")
}
