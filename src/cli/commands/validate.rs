//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the retriever configuration file.

use crate::config::{load_config, RetrieverConfig};
use crate::core::postprocess::PostProcessorRegistry;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        match load_config(config_path) {
            Ok(config) => {
                println!("✅ Configuration is valid");
                println!();
                print_summary(&config);
                Ok(0)
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                Ok(2) // Configuration error exit code
            }
        }
    }
}

fn print_summary(config: &RetrieverConfig) {
    let registry = PostProcessorRegistry::builtin();

    println!("Configuration Summary:");
    println!("  Project: {}", config.project);
    println!("  Entity Source: {}", config.entity_source);
    println!("  Log Level: {}", config.application.log_level);
    println!("  Dry Run: {}", config.application.dry_run);
    println!(
        "  Fetch: {} (max workers: {})",
        if config.fetch.parallel { "parallel" } else { "sequential" },
        config.fetch.max_workers
    );
    println!("  Match Threshold: {}", config.matching.threshold);
    println!(
        "  Output: {} {} / {}",
        config.output.destination, config.output.host, config.output.index
    );
    match &config.notifications {
        Some(n) => println!("  Notifications: {} {}", n.destination, n.topic_arn),
        None => println!("  Notifications: disabled"),
    }
    println!();

    println!("Sources:");
    for source in &config.sources {
        let role = if source.name == config.entity_source {
            "entities"
        } else {
            "datasets"
        };
        println!("  - {} [{}] ({role})", source.name, source.kind);
        println!("    API: {}", source.api_base_url);
        if let Some(match_key) = source.resolved_match_key() {
            println!("    Match Key: {match_key}");
        }
        if let Some(name) = &source.post_processor {
            let known = if registry.get(name).is_some() { "" } else { " (unknown, ignored)" };
            println!("    Post-processor: {name}{known}");
        }
    }
    println!();
}
