//! Run command implementation
//!
//! This module implements the `run` command: dispatch every source, write the
//! resulting mappings to the configured sink and send the run notification.

use crate::adapters::opensearch::{MappingSink, OpenSearchClient};
use crate::config::{load_config, RetrieverConfig};
use crate::core::dispatch::{DispatchSummary, Dispatcher, FetchMode};
use crate::core::notify::{
    build_notification_message, build_notifier, LogNotifier, Notifier, NOTIFICATION_SUBJECT,
};
use crate::domain::{EntityMapping, OutputError, RetrieverError};
use chrono::Local;
use clap::Args;

/// Exit code for a complete run
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code when some sources or documents were lost
pub const EXIT_DEGRADED: i32 = 1;
/// Exit code for configuration errors
pub const EXIT_CONFIG_ERROR: i32 = 2;
/// Exit code when the sink cannot be reached
pub const EXIT_CONNECTION_ERROR: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;

/// Arguments for the run command
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Dry run mode - fetch and match without writing or notifying
    #[arg(long)]
    pub dry_run: bool,

    /// Fetch sources in parallel using `fetch.max_workers` workers
    #[arg(long)]
    pub parallel_fetch: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting run command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Configuration error: {e}");
                return Ok(EXIT_CONFIG_ERROR);
            }
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }
        if self.parallel_fetch {
            tracing::info!("Enabling parallel fetch from CLI");
            config.fetch.parallel = true;
        }

        let notifier: Box<dyn Notifier> = if config.application.dry_run {
            Box::new(LogNotifier)
        } else {
            match build_notifier(config.notifications.as_ref()).await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create notifier");
                    eprintln!("Notification error: {e}");
                    return Ok(EXIT_CONFIG_ERROR);
                }
            }
        };

        let sink = if config.application.dry_run {
            tracing::info!("Dry run mode enabled - no data will be written");
            println!("🔍 DRY RUN MODE - No data will be written and no notification sent");
            println!();
            None
        } else {
            match OpenSearchClient::connect(&config.output).await {
                Ok(client) => Some(client),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to connect to output sink");
                    eprintln!("Failed to connect to output sink: {e}");
                    send_notification(notifier.as_ref(), false, &[], &config.project).await;
                    return Ok(exit_code_for(&e));
                }
            }
        };

        let dispatcher = match Dispatcher::from_config(&config) {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create dispatcher");
                eprintln!("Failed to initialize run: {e}");
                return Ok(EXIT_FATAL);
            }
        };

        println!("🚀 Starting data retrieval...");
        println!();

        let sink = sink.as_ref().map(|s| s as &dyn MappingSink);
        Ok(run_pipeline(&config, &dispatcher, sink, notifier.as_ref()).await)
    }
}

/// Dispatch, persist and notify for one configuration
///
/// A `None` sink means dry run: mappings are neither written nor announced.
/// Returns the process exit code.
pub async fn run_pipeline(
    config: &RetrieverConfig,
    dispatcher: &Dispatcher,
    sink: Option<&dyn MappingSink>,
    notifier: &dyn Notifier,
) -> i32 {
    let mode = FetchMode::from_flag(config.fetch.parallel, config.fetch.max_workers);

    let summary = match dispatcher.run(config, mode).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Pipeline failed");
            eprintln!("Pipeline failed: {e}");
            if sink.is_some() {
                send_notification(notifier, false, &[], &config.project).await;
            }
            return exit_code_for(&e);
        }
    };
    summary.log_summary();
    print_summary(&summary);

    let Some(sink) = sink else {
        tracing::info!(
            mappings = summary.mappings.len(),
            "Dry run - skipping write and notification"
        );
        return degraded_or_success(&summary, 0);
    };

    match sink.write_mappings(&summary.mappings).await {
        Ok(written) => {
            println!("  Documents Written: {}", written.success_count);
            for failure in &written.failures {
                println!("  - {}: {}", failure.entity_id, failure.error);
            }
            println!();
            send_notification(notifier, true, &summary.mappings, &config.project).await;
            degraded_or_success(&summary, written.failure_count)
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to write mappings");
            eprintln!("Failed to write mappings: {e}");
            send_notification(notifier, false, &summary.mappings, &config.project).await;
            exit_code_for(&e)
        }
    }
}

async fn send_notification(
    notifier: &dyn Notifier,
    success: bool,
    mappings: &[EntityMapping],
    project: &str,
) {
    let message = build_notification_message(success, mappings, project, Local::now());
    if let Err(e) = notifier.notify(NOTIFICATION_SUBJECT, &message).await {
        tracing::error!(error = %e, "Failed to send notification");
    }
}

fn print_summary(summary: &DispatchSummary) {
    println!("📊 Run Summary:");
    println!("  Sources: {}", summary.sources_total);
    println!("  Failed Sources: {}", summary.sources_failed);
    println!("  Entities: {}", summary.entity_count);
    println!("  Entities Linked: {}", summary.mappings.len());
    println!("  Total Links: {}", summary.link_count);
    println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
    println!();
}

fn degraded_or_success(summary: &DispatchSummary, rejected_documents: usize) -> i32 {
    if summary.is_complete() && rejected_documents == 0 {
        println!("✅ Run completed successfully!");
        EXIT_SUCCESS
    } else {
        println!("⚠️  Run completed with missing data");
        EXIT_DEGRADED
    }
}

/// Map an error to the process exit code
pub fn exit_code_for(error: &RetrieverError) -> i32 {
    match error {
        RetrieverError::Configuration(_) | RetrieverError::Validation(_) => EXIT_CONFIG_ERROR,
        RetrieverError::Output(OutputError::MissingCredentials(_)) => EXIT_CONFIG_ERROR,
        RetrieverError::Output(OutputError::ConnectionFailed { .. }) => EXIT_CONNECTION_ERROR,
        RetrieverError::Fetch(e) if e.is_transport() => EXIT_CONNECTION_ERROR,
        _ => EXIT_FATAL,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::http::ReqwestJsonClient;
    use crate::adapters::opensearch::BulkWriteResult;
    use crate::config::{load_config_from_str, FetchConfig};
    use crate::domain::Result;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSink {
        written: Mutex<Vec<EntityMapping>>,
    }

    #[async_trait]
    impl MappingSink for RecordingSink {
        async fn write_mappings(&self, mappings: &[EntityMapping]) -> Result<BulkWriteResult> {
            self.written.lock().unwrap().extend_from_slice(mappings);
            Ok(BulkWriteResult {
                attempted: mappings.len(),
                success_count: mappings.len(),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, _subject: &str, message: &str) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    fn config(base_url: &str) -> RetrieverConfig {
        load_config_from_str(&toml_for(base_url)).unwrap()
    }

    fn toml_for(base_url: &str) -> String {
        format!(
            r#"
project = "ICDC"
entity_source = "ICDC"

[[sources]]
name = "ICDC"
api_base_url = "{base_url}"
endpoint = "/studies"
entity_id_key = "clinical_study_designation"

[[sources]]
name = "IDC"
api_base_url = "{base_url}"
endpoint = "/collections"
entity_id_key = "clinical_study_designation"
match_key = "collection_id"
dataset_base_url = "https://idc.example.org/{{collection_id}}"
dataset_base_url_param = "collection_id"

[output]
host = "http://localhost:9200"
index = "icdc"
"#
        )
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(ReqwestJsonClient::new(&FetchConfig::default()).unwrap()))
    }

    async fn mock_sources(server: &mut mockito::ServerGuard) {
        server
            .mock("GET", "/studies")
            .with_body(r#"[{"clinical_study_designation": "GLIOMA01"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/collections")
            .with_body(r#"[[{"collection_id": "icdc_glioma"}], [{"collection_id": "tcga_brca"}]]"#)
            .create_async()
            .await;
    }

    #[tokio::test]
    async fn test_run_writes_and_notifies() {
        let mut server = mockito::Server::new_async().await;
        mock_sources(&mut server).await;
        let config = config(&server.url());
        let sink = RecordingSink::default();
        let notifier = RecordingNotifier::default();

        let code = run_pipeline(&config, &dispatcher(), Some(&sink), &notifier).await;

        assert_eq!(code, EXIT_SUCCESS);
        let written = sink.written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].links[0].url, "https://idc.example.org/icdc_glioma");

        let messages = notifier.messages.lock().unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("✅"));
        assert!(messages[0].contains("Found CRDC dataset links for 1 entities"));
    }

    #[tokio::test]
    async fn test_dry_run_skips_write_and_notification() {
        let mut server = mockito::Server::new_async().await;
        mock_sources(&mut server).await;
        let config = config(&server.url());
        let notifier = RecordingNotifier::default();

        let code = run_pipeline(&config, &dispatcher(), None, &notifier).await;

        assert_eq!(code, EXIT_SUCCESS);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_source_degrades_run() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/studies")
            .with_body(r#"[{"clinical_study_designation": "GLIOMA01"}]"#)
            .create_async()
            .await;
        server
            .mock("GET", "/collections")
            .with_status(500)
            .create_async()
            .await;
        let config = config(&server.url());
        let sink = RecordingSink::default();
        let notifier = RecordingNotifier::default();

        let code = run_pipeline(&config, &dispatcher(), Some(&sink), &notifier).await;

        assert_eq!(code, EXIT_DEGRADED);
        assert!(sink.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_configured_sns_without_credentials_is_config_error() {
        std::env::remove_var("AWS_ACCESS_KEY_ID");
        std::env::remove_var("AWS_SECRET_ACCESS_KEY");
        let mut toml = toml_for("http://localhost:1");
        toml.push_str(
            "\n[notifications]\ndestination = \"sns\"\ntopic_arn = \"arn:aws:sns:us-east-1:1:t\"\n",
        );
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, toml.as_bytes()).unwrap();

        let args = RunArgs::default();
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();

        assert_eq!(code, EXIT_CONFIG_ERROR);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            exit_code_for(&RetrieverError::Configuration("x".to_string())),
            EXIT_CONFIG_ERROR
        );
        assert_eq!(
            exit_code_for(&OutputError::MissingCredentials("x".to_string()).into()),
            EXIT_CONFIG_ERROR
        );
        assert_eq!(
            exit_code_for(
                &OutputError::ConnectionFailed {
                    host: "h".to_string(),
                    message: "refused".to_string()
                }
                .into()
            ),
            EXIT_CONNECTION_ERROR
        );
        assert_eq!(exit_code_for(&RetrieverError::Other("x".to_string())), EXIT_FATAL);
    }
}
