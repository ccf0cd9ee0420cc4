//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for the exporter using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// IoT Exporter - IoT telemetry to object storage ETL Tool
#[derive(Parser, Debug)]
#[command(name = "iot-exporter")]
#[command(version, about, long_about = None)]
#[command(author = "IoT Exporter Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "iot-exporter.toml", env = "IOT_EXPORTER_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "IOT_EXPORTER_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export thing telemetry for the current window
    Export(commands::export::ExportArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
