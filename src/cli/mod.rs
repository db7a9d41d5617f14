//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the retriever using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Data Retriever - links study entities to external dataset repositories
#[derive(Parser, Debug)]
#[command(name = "data-retriever")]
#[command(version, about, long_about = None)]
#[command(author = "Data Retriever Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "retriever.toml", env = "RETRIEVER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RETRIEVER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch all sources, match them to entities and write the mappings
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),
}
