//! Configuration schema types
//!
//! This module defines the configuration structure that maps to the TOML file.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// How a source's data is retrieved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FetchKind {
    /// Single GET against `api_base_url + endpoint`
    #[default]
    Direct,
    /// Listing call, then one follow-up GET per discovered match
    Discovery,
    /// Single POST carrying a query document (GraphQL style)
    #[serde(alias = "graphql")]
    Query,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Direct => write!(f, "direct"),
            FetchKind::Discovery => write!(f, "discovery"),
            FetchKind::Query => write!(f, "query"),
        }
    }
}

/// Main retriever configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Project name, used in notifications
    pub project: String,

    /// Name of the source whose records define the entities
    pub entity_source: String,

    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Fetch-phase settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Entity matching settings
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Configured data sources, in processing order
    pub sources: Vec<SourceConfig>,

    /// Persistence sink
    pub output: OutputConfig,

    /// Optional run notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationsConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl RetrieverConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        if self.project.trim().is_empty() {
            return Err("Missing 'project' key in config".to_string());
        }
        if self.entity_source.trim().is_empty() {
            return Err("Missing 'entity_source' key in config".to_string());
        }

        self.application.validate()?;
        self.fetch.validate()?;
        self.matching.validate()?;

        self.entity_source_config()?;
        for source in &self.sources {
            source.validate(source.name == self.entity_source)?;
        }

        self.output.validate()?;
        if let Some(ref notifications) = self.notifications {
            notifications.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }

    /// Look up a source by name
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Resolve the entity source, checking the sources list is well-formed
    ///
    /// # Errors
    ///
    /// Returns an error if the list is empty, names repeat, or no source
    /// carries the configured entity source name.
    pub fn entity_source_config(&self) -> Result<&SourceConfig, String> {
        if self.sources.is_empty() {
            return Err("Missing or invalid 'sources' section in config".to_string());
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err("Each data source must define a non-empty 'name'".to_string());
            }
            if !seen.insert(source.name.as_str()) {
                return Err(format!("Duplicate source name '{}'", source.name));
            }
        }

        self.source(&self.entity_source).ok_or_else(|| {
            format!(
                "entity_source '{}' does not name a configured source",
                self.entity_source
            )
        })
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode (don't write to the sink or notify)
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// Fetch-phase configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Fetch sources concurrently
    #[serde(default)]
    pub parallel: bool,

    /// Width of the bounded-parallel worker pool
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Connect timeout per request
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,

    /// Read timeout per request
    #[serde(default = "default_read_timeout_seconds")]
    pub read_timeout_seconds: u64,
}

impl FetchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_workers == 0 || self.max_workers > 64 {
            return Err(format!(
                "fetch.max_workers must be between 1 and 64, got {}",
                self.max_workers
            ));
        }
        if self.connect_timeout_seconds == 0 {
            return Err("fetch.connect_timeout_seconds must be > 0".to_string());
        }
        if self.read_timeout_seconds < self.connect_timeout_seconds {
            return Err(format!(
                "fetch.read_timeout_seconds ({}) must not be shorter than fetch.connect_timeout_seconds ({})",
                self.read_timeout_seconds, self.connect_timeout_seconds
            ));
        }
        Ok(())
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            max_workers: default_max_workers(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            read_timeout_seconds: default_read_timeout_seconds(),
        }
    }
}

/// Entity matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum partial-ratio score (0-100) for a fuzzy match
    #[serde(default = "default_match_threshold")]
    pub threshold: f64,
}

impl MatchingConfig {
    fn validate(&self) -> Result<(), String> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(format!(
                "matching.threshold must be between 0 and 100, got {}",
                self.threshold
            ));
        }
        Ok(())
    }
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_match_threshold(),
        }
    }
}

/// Discovery phase of a two-phase source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Listing endpoint, appended to `api_base_url`
    pub endpoint: String,

    /// Field holding the value each follow-up fetch is keyed on
    pub match_key: String,

    /// Only listing entries whose match value starts with this are fetched
    pub filter_prefix: String,
}

/// Follow-up fetch of a two-phase source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchTemplateConfig {
    /// Endpoint template with a `{key_param}` placeholder
    pub endpoint_template: String,

    /// Placeholder name substituted with each discovered value
    pub key_param: String,

    /// Match key for the fetched records, if different from discovery's
    #[serde(default)]
    pub match_key: Option<String>,
}

/// Declarative description of one external data source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique source name; also the `repository` of produced links
    pub name: String,

    /// Fetch strategy
    #[serde(default)]
    pub kind: FetchKind,

    /// Base URL every endpoint is appended to
    pub api_base_url: String,

    /// Entity field compared against this source's match values
    pub entity_id_key: String,

    /// Endpoint for direct and query sources
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Query document for query sources
    #[serde(default)]
    pub query: Option<String>,

    /// Dotted path to the payload inside the response
    #[serde(default)]
    pub response_data_key: Option<String>,

    /// Prefix filter applied to direct results
    #[serde(default)]
    pub filter_prefix: Option<String>,

    /// Field holding the value matched against entity ids
    #[serde(default)]
    pub match_key: Option<String>,

    /// Discovery phase (discovery sources)
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,

    /// Follow-up fetch (discovery sources)
    #[serde(default)]
    pub fetch: Option<FetchTemplateConfig>,

    /// Dataset URL template for produced links
    #[serde(default)]
    pub dataset_base_url: Option<String>,

    /// Placeholder in `dataset_base_url` substituted with the matched id
    #[serde(default)]
    pub dataset_base_url_param: Option<String>,

    /// Registered post-processor name
    #[serde(default)]
    pub post_processor: Option<String>,
}

impl SourceConfig {
    /// Match key used when mapping this source
    ///
    /// Falls back to the discovery block, then the fetch block.
    pub fn resolved_match_key(&self) -> Option<&str> {
        self.match_key
            .as_deref()
            .or_else(|| self.discovery.as_ref().map(|d| d.match_key.as_str()))
            .or_else(|| self.fetch.as_ref().and_then(|f| f.match_key.as_deref()))
            .filter(|k| !k.is_empty())
    }

    fn validate(&self, is_entity_source: bool) -> Result<(), String> {
        if self.api_base_url.is_empty() || self.entity_id_key.is_empty() {
            return Err(format!(
                "Source '{}' must define a 'name', 'kind', 'api_base_url' and 'entity_id_key'",
                self.name
            ));
        }

        match url::Url::parse(&self.api_base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                return Err(format!(
                    "sources.{}.api_base_url must be an http:// or https:// URL",
                    self.name
                ))
            }
        }

        match self.kind {
            FetchKind::Direct => {
                if self.discovery.is_some() {
                    return Err(format!(
                        "Source '{}' is 'direct' but defines a 'discovery' block",
                        self.name
                    ));
                }
                self.require_endpoint()?;
            }
            FetchKind::Discovery => {
                if self.endpoint.is_some() {
                    return Err(format!(
                        "Source '{}' must define either 'endpoint' or 'discovery', not both",
                        self.name
                    ));
                }
                let discovery = self.discovery.as_ref().ok_or_else(|| {
                    format!("Source '{}' is 'discovery' but has no 'discovery' block", self.name)
                })?;
                if discovery.endpoint.is_empty()
                    || discovery.match_key.is_empty()
                    || discovery.filter_prefix.is_empty()
                {
                    return Err(format!(
                        "sources.{}.discovery requires defined 'endpoint', 'match_key' and 'filter_prefix'",
                        self.name
                    ));
                }
                let fetch = self.fetch.as_ref().ok_or_else(|| {
                    format!(
                        "Source '{}' using 'discovery' must define a 'fetch' section with 'endpoint_template' and 'key_param'",
                        self.name
                    )
                })?;
                if fetch.key_param.is_empty() || fetch.endpoint_template.is_empty() {
                    return Err(format!(
                        "sources.{}.fetch requires defined 'endpoint_template' and 'key_param'",
                        self.name
                    ));
                }
                require_placeholder(
                    &format!("sources.{}.fetch.endpoint_template", self.name),
                    &fetch.endpoint_template,
                    &fetch.key_param,
                )?;
            }
            FetchKind::Query => {
                self.require_endpoint()?;
                if self.query.as_deref().map_or(true, |q| q.trim().is_empty()) {
                    return Err(format!(
                        "Source '{}' is a 'query' source and must have a valid 'query'",
                        self.name
                    ));
                }
            }
        }

        if !is_entity_source {
            let url = self.dataset_base_url.as_deref().unwrap_or_default();
            let param = self.dataset_base_url_param.as_deref().unwrap_or_default();
            if url.is_empty() || param.is_empty() {
                return Err(format!(
                    "Source '{}' must define 'dataset_base_url' and 'dataset_base_url_param'",
                    self.name
                ));
            }
            require_placeholder(&format!("sources.{}.dataset_base_url", self.name), url, param)?;

            if self.resolved_match_key().is_none() {
                return Err(format!(
                    "Source '{}' must define 'match_key' directly or under 'discovery'/'fetch'",
                    self.name
                ));
            }
        }

        Ok(())
    }

    fn require_endpoint(&self) -> Result<(), String> {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.is_empty() => Ok(()),
            _ => Err(format!(
                "Source '{}' must define either 'endpoint' or 'discovery'",
                self.name
            )),
        }
    }
}

fn require_placeholder(field: &str, template: &str, param: &str) -> Result<(), String> {
    if template.contains(&format!("{{{param}}}")) {
        Ok(())
    } else {
        Err(format!("{field} must contain the placeholder '{{{param}}}'"))
    }
}

/// Persistence sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Sink type; only "opensearch" is supported
    #[serde(default = "default_output_destination")]
    pub destination: String,

    /// OpenSearch host URL
    pub host: String,

    /// Index the mappings are written to
    pub index: String,

    /// Connect over TLS
    #[serde(default)]
    pub use_ssl: bool,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub verify_certs: bool,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    /// Username; falls back to `OPENSEARCH_USERNAME`
    #[serde(default, skip_serializing)]
    pub username: Option<SecretString>,

    /// Password; falls back to `OPENSEARCH_PASSWORD`
    /// Stored securely in memory and automatically zeroized on drop
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
}

impl OutputConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.destination.eq_ignore_ascii_case("opensearch") {
            return Err(
                "Currently, only 'opensearch' is supported as an output destination".to_string(),
            );
        }
        if self.host.is_empty() {
            return Err("Missing required 'output' config key: host".to_string());
        }
        if self.index.is_empty() {
            return Err("Missing required 'output' config key: index".to_string());
        }
        if url::Url::parse(&self.host).is_err() {
            return Err(format!("output.host '{}' is not a valid URL", self.host));
        }
        Ok(())
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Notification channel; only "sns" is supported
    pub destination: String,

    /// Topic the run report is published to
    pub topic_arn: String,

    /// Region of the topic
    #[serde(default)]
    pub region: Option<String>,
}

impl NotificationsConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.destination.eq_ignore_ascii_case("sns") {
            return Err(
                "Currently, only 'sns' is supported as a notification destination".to_string(),
            );
        }
        if self.topic_arn.is_empty() {
            return Err("Missing required 'notifications' config key: topic_arn".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err(
                "logging.local_path cannot be empty when local logging is enabled".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    8
}

fn default_connect_timeout_seconds() -> u64 {
    5
}

fn default_read_timeout_seconds() -> u64 {
    30
}

fn default_match_threshold() -> f64 {
    75.0
}

fn default_output_destination() -> String {
    "opensearch".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    60
}

fn default_local_path() -> String {
    "tmp".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
