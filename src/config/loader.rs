//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::RetrieverConfig;
use super::secret::secret_from_env;
use crate::domain::errors::RetrieverError;
use crate::domain::result::Result;
use regex::{Captures, Regex};
use std::fs;
use std::path::Path;

/// Environment variable holding the OpenSearch user
pub const OPENSEARCH_USERNAME_ENV: &str = "OPENSEARCH_USERNAME";

/// Environment variable holding the OpenSearch password
pub const OPENSEARCH_PASSWORD_ENV: &str = "OPENSEARCH_PASSWORD";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` and `${VAR:-fallback}`)
/// 3. Parses the TOML into RetrieverConfig
/// 4. Applies environment variable overrides (RETRIEVER_* prefix)
/// 5. Fills sink credentials from `OPENSEARCH_USERNAME` / `OPENSEARCH_PASSWORD`
/// 6. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable without fallback is unset
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use data_retriever::config::loader::load_config;
///
/// let config = load_config("retriever.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RetrieverConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RetrieverError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        RetrieverError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    load_config_from_str(&contents)
}

/// Same as [`load_config`] but from TOML text already in memory
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_str(contents: &str) -> Result<RetrieverConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: RetrieverConfig = toml::from_str(&contents)
        .map_err(|e| RetrieverError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;
    apply_credentials(&mut config);

    config.validate().map_err(|e| {
        RetrieverError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// `${VAR_NAME:-fallback}` uses `fallback` when the variable is unset and
/// logs a warning. Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is unset and
/// has no fallback
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
        .map_err(|e| RetrieverError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let processed = re.replace_all(line, |cap: &Captures| {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => value,
                Err(_) => match cap.get(2) {
                    Some(fallback) => {
                        tracing::warn!(
                            variable = var_name,
                            "Environment variable not set, using fallback value"
                        );
                        fallback.as_str().to_string()
                    }
                    None => {
                        if !missing_vars.iter().any(|v| v == var_name) {
                            missing_vars.push(var_name.to_string());
                        }
                        cap[0].to_string()
                    }
                },
            }
        });
        result.push_str(&processed);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RetrieverError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using RETRIEVER_* prefix
///
/// Environment variables follow the pattern: RETRIEVER_<SECTION>_<KEY>
/// For example: RETRIEVER_FETCH_PARALLEL, RETRIEVER_OUTPUT_INDEX
fn apply_env_overrides(config: &mut RetrieverConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("RETRIEVER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("RETRIEVER_APPLICATION_DRY_RUN") {
        config.application.dry_run = val.parse().unwrap_or(false);
    }

    // Fetch overrides
    if let Ok(val) = std::env::var("RETRIEVER_FETCH_PARALLEL") {
        config.fetch.parallel = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("RETRIEVER_FETCH_MAX_WORKERS") {
        let workers = val.parse().map_err(|_| {
            RetrieverError::Configuration(format!(
                "RETRIEVER_FETCH_MAX_WORKERS must be a positive integer, got '{val}'"
            ))
        })?;
        config.fetch.max_workers = workers;
    }

    // Output overrides
    if let Ok(val) = std::env::var("RETRIEVER_OUTPUT_HOST") {
        config.output.host = val;
    }
    if let Ok(val) = std::env::var("RETRIEVER_OUTPUT_INDEX") {
        config.output.index = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("RETRIEVER_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("RETRIEVER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

/// Fills unset sink credentials from the environment
fn apply_credentials(config: &mut RetrieverConfig) {
    if config.output.username.is_none() {
        config.output.username = secret_from_env(OPENSEARCH_USERNAME_ENV);
    }
    if config.output.password.is_none() {
        config.output.password = secret_from_env(OPENSEARCH_PASSWORD_ENV);
    }
}
