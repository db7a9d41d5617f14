//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use data_retriever::config::{load_config, FetchKind};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("RETRIEVER_APPLICATION_LOG_LEVEL");
    std::env::remove_var("RETRIEVER_APPLICATION_DRY_RUN");
    std::env::remove_var("RETRIEVER_FETCH_PARALLEL");
    std::env::remove_var("RETRIEVER_FETCH_MAX_WORKERS");
    std::env::remove_var("RETRIEVER_OUTPUT_INDEX");
    std::env::remove_var("OPENSEARCH_USERNAME");
    std::env::remove_var("OPENSEARCH_PASSWORD");
    std::env::remove_var("TEST_TCIA_BASE_URL");
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const COMPLETE_CONFIG: &str = r#"
project = "ICDC"
entity_source = "ICDC"

[application]
log_level = "debug"
dry_run = true

[fetch]
parallel = true
max_workers = 4

[matching]
threshold = 80

[[sources]]
name = "ICDC"
kind = "graphql"
api_base_url = "https://caninecommons.cancer.gov"
endpoint = "/v1/graphql/"
query = "{ studiesByProgram { clinical_study_designation } }"
response_data_key = "data.studiesByProgram"
entity_id_key = "clinical_study_designation"

[[sources]]
name = "IDC"
api_base_url = "https://api.imaging.datacommons.cancer.gov"
endpoint = "/v2/collections"
entity_id_key = "clinical_study_designation"
match_key = "collection_id"
filter_prefix = "icdc_"
dataset_base_url = "https://portal.imaging.datacommons.cancer.gov/explore/filters/?collection_id={collection_id}"
dataset_base_url_param = "collection_id"
post_processor = "clean_idc_metadata"

[[sources]]
name = "TCIA"
kind = "discovery"
api_base_url = "${TEST_TCIA_BASE_URL:-https://services.cancerimagingarchive.net/services/v4/TCIA/query}"
entity_id_key = "clinical_study_designation"
dataset_base_url = "https://www.cancerimagingarchive.net/collection/{collection_id}"
dataset_base_url_param = "collection_id"
post_processor = "aggregate_tcia_series_data"

[sources.discovery]
endpoint = "/getCollectionValues"
match_key = "Collection"
filter_prefix = "ICDC-"

[sources.fetch]
endpoint_template = "/getSeries?Collection={collection_id}"
key_param = "collection_id"

[output]
host = "https://search.example.org"
index = "icdc_crdc_links"
verify_certs = false

[notifications]
destination = "SNS"
topic_arn = "arn:aws:sns:us-east-1:123456789012:retriever"

[logging]
local_enabled = false
local_rotation = "hourly"
"#;

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(COMPLETE_CONFIG);
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.project, "ICDC");
    assert_eq!(config.application.log_level, "debug");
    assert!(config.application.dry_run);
    assert!(config.fetch.parallel);
    assert_eq!(config.fetch.max_workers, 4);
    assert_eq!(config.matching.threshold, 80.0);

    assert_eq!(config.sources.len(), 3);
    assert_eq!(config.sources[0].kind, FetchKind::Query);
    assert_eq!(config.sources[1].kind, FetchKind::Direct);
    assert_eq!(config.sources[2].kind, FetchKind::Discovery);
    assert_eq!(config.sources[2].resolved_match_key(), Some("Collection"));
    assert_eq!(
        config.sources[2].api_base_url,
        "https://services.cancerimagingarchive.net/services/v4/TCIA/query"
    );

    assert!(!config.output.verify_certs);
    assert!(config.output.username.is_none());
    assert!(config.notifications.is_some());
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_overrides_and_credentials() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    std::env::set_var("RETRIEVER_FETCH_MAX_WORKERS", "16");
    std::env::set_var("RETRIEVER_OUTPUT_INDEX", "override_index");
    std::env::set_var("OPENSEARCH_USERNAME", "admin");
    std::env::set_var("OPENSEARCH_PASSWORD", "s3cret");
    std::env::set_var("TEST_TCIA_BASE_URL", "http://localhost:8080");

    let file = write_config(COMPLETE_CONFIG);
    let result = load_config(file.path());
    cleanup_env_vars();

    let config = result.unwrap();
    assert_eq!(config.fetch.max_workers, 16);
    assert_eq!(config.output.index, "override_index");
    assert_eq!(config.sources[2].api_base_url, "http://localhost:8080");
    assert_eq!(
        config.output.username.as_ref().unwrap().expose_secret().as_ref(),
        "admin"
    );
}

#[test]
fn test_unknown_entity_source_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&COMPLETE_CONFIG.replace(
        "entity_source = \"ICDC\"",
        "entity_source = \"CDS\"",
    ));
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("entity_source 'CDS'"));
}

#[test]
fn test_unknown_source_kind_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&COMPLETE_CONFIG.replace("kind = \"discovery\"", "kind = \"soap\""));
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_missing_dataset_url_param_placeholder_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(&COMPLETE_CONFIG.replace(
        "https://www.cancerimagingarchive.net/collection/{collection_id}",
        "https://www.cancerimagingarchive.net/collection/",
    ));
    assert!(load_config(file.path()).is_err());
}

#[test]
fn test_invalid_max_workers_override_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    std::env::set_var("RETRIEVER_FETCH_MAX_WORKERS", "many");
    let file = write_config(COMPLETE_CONFIG);
    let result = load_config(file.path());
    cleanup_env_vars();

    assert!(result.is_err());
}

#[test]
fn test_missing_file() {
    let err = load_config("/nonexistent/retriever.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));
}
