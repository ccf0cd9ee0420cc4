//! Validate config command implementation
//!
//! Loads the configuration file, applies env overrides and reports the
//! effective settings.

use crate::config::load_config;
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

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let settings = config.extraction_settings();
        let tags = config.iot.tag_filter();

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  API: {}", config.iot.effective_api_url());
        println!(
            "  Organization: {}",
            config.iot.organization().unwrap_or("-")
        );
        if tags.is_empty() {
            println!("  Things: all");
        } else {
            println!("  Things: tagged {tags:?}");
        }
        if settings.is_raw() {
            println!("  Resolution: raw");
        } else {
            println!("  Resolution: {}s", settings.resolution_seconds);
        }
        println!("  Window: {} minutes", settings.window_minutes);
        println!("  Aggregation: {}", settings.aggregation_statistic);
        println!("  Align Window: {}", settings.align_with_time_window);
        println!("  Max Concurrency: {}", settings.max_concurrency);
        println!("  Bucket: {}", config.destination.bucket);
        println!("  Compression: {}", config.destination.enable_compression);
        println!();
        Ok(0)
    }
}
