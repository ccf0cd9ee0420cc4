//! Export command implementation
//!
//! This module implements the `export` command, which extracts the current
//! window of thing telemetry and stores it in the configured bucket.

use crate::config::{load_config, IntervalSetting};
use crate::core::export::Exporter;
use crate::domain::{ExporterError, IotApiError};
use chrono::Utc;
use clap::Args;
use std::time::Duration;
use tokio::sync::watch;

/// Exit code for a run that stored output but had failed things
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code for configuration errors
pub const EXIT_CONFIG: i32 = 2;
/// Exit code for connection and authentication errors
pub const EXIT_CONNECTION: i32 = 4;
/// Exit code for any other failure
pub const EXIT_FATAL: i32 = 5;
/// Exit code after an interrupt signal
pub const EXIT_INTERRUPTED: i32 = 130;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Override resolution (seconds, `raw`, `1 minute`, `5 minutes`, `15 minutes`, `1 hour`)
    #[arg(long)]
    pub resolution: Option<String>,

    /// Override extraction window (minutes, `5 minutes`, `15 minutes`, `1 hour`, `1 day`)
    #[arg(long)]
    pub schedule: Option<String>,

    /// Override thing tag filter (`key=value,key2=value2`)
    #[arg(long)]
    pub tags: Option<String>,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(
        &self,
        config_path: &str,
        mut shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let mut config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load configuration");
                eprintln!("Failed to load configuration: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        // Apply CLI overrides
        if let Some(resolution) = &self.resolution {
            tracing::info!(resolution = %resolution, "Overriding resolution from CLI");
            config.extraction.resolution = IntervalSetting::parse(resolution);
        }
        if let Some(schedule) = &self.schedule {
            tracing::info!(schedule = %schedule, "Overriding schedule from CLI");
            config.extraction.schedule = IntervalSetting::parse(schedule);
        }
        if let Some(tags) = &self.tags {
            tracing::info!(tags = %tags, "Overriding tag filter from CLI");
            config.iot.tags = Some(tags.clone());
        }

        if let Err(e) = config.validate() {
            tracing::error!(error = %e, "Configuration validation failed");
            eprintln!("Configuration validation failed: {e}");
            return Ok(EXIT_CONFIG);
        }

        let exporter = match Exporter::from_config(&config) {
            Ok(exporter) => exporter,
            Err(e) => {
                tracing::error!(error = %e, "Failed to initialize exporter");
                eprintln!("Failed to initialize export: {e}");
                return Ok(exit_code_for(&e));
            }
        };

        let timeout = Duration::from_secs(config.export.timeout_seconds);
        println!("🚀 Starting export...");
        println!();

        let now = Utc::now();
        let outcome = tokio::select! {
            result = tokio::time::timeout(timeout, exporter.run_at(now)) => result,
            _ = shutdown_signal.changed() => {
                tracing::warn!("Export interrupted before completion");
                exporter.discard_output_at(now);
                println!("⚠️  Export interrupted, nothing was stored.");
                return Ok(EXIT_INTERRUPTED);
            }
        };

        let summary = match outcome {
            Ok(Ok(summary)) => summary,
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                return Ok(exit_code_for(&e));
            }
            Err(_) => {
                tracing::error!(timeout_secs = timeout.as_secs(), "Export timed out");
                exporter.discard_output_at(now);
                eprintln!("Export timed out after {}s", timeout.as_secs());
                return Ok(EXIT_FATAL);
            }
        };

        println!("📊 Export Summary:");
        if let Some(window) = &summary.window {
            println!("  Window: {} .. {}", window.from, window.to);
        }
        println!("  Things Listed: {}", summary.things_listed);
        println!("  Things Processed: {}", summary.things_processed);
        println!("  Things Skipped: {}", summary.things_skipped);
        println!("  Things Failed: {}", summary.things_failed);
        println!("  Rows: {}", summary.rows_exported);
        if let Some(key) = &summary.object_key {
            println!("  Stored As: {key}");
        }
        println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
        println!();

        if !summary.errors.is_empty() {
            println!("⚠️  Errors encountered:");
            for error in &summary.errors {
                println!("  - {:?}: {}", error.error_type, error.message);
                if let Some(context) = &error.context {
                    println!("    Context: {context}");
                }
            }
            println!();
        }

        let exit_code = if summary.is_successful() {
            println!("✅ Export completed successfully!");
            0
        } else {
            println!("⚠️  Export completed with failures");
            EXIT_PARTIAL
        };

        Ok(exit_code)
    }
}

/// Maps a run-level error to a process exit code
pub fn exit_code_for(error: &ExporterError) -> i32 {
    match error {
        ExporterError::Configuration(_) | ExporterError::Validation(_) => EXIT_CONFIG,
        ExporterError::Authentication(_)
        | ExporterError::Iot(IotApiError::AuthenticationFailed(_))
        | ExporterError::Iot(IotApiError::ConnectionFailed(_))
        | ExporterError::Iot(IotApiError::Timeout(_)) => EXIT_CONNECTION,
        _ => EXIT_FATAL,
    }
}
