//! Configuration management for the IoT exporter.
//!
//! This module provides TOML-based configuration loading, parsing, and validation.
//!
//! # Overview
//!
//! The exporter reads a TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `IOT_EXPORTER_*` environment overrides
//! - Default values for optional settings
//! - Validation on load
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use iot_exporter::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("iot-exporter.toml")?;
//!
//! println!("API: {}", config.iot.effective_api_url());
//! println!("Window: {} minutes", config.extraction.window_minutes());
//! println!("Bucket: {}", config.destination.bucket);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`IotConfig`] - API endpoint, credentials and thing tag filter
//! - [`ExtractionConfig`] - Resolution, window, statistic and concurrency
//! - [`RetryConfig`] - Rate-limit retry budget
//! - [`DestinationConfig`] - Bucket and compression
//! - [`ExportConfig`] - Whole-run deadline
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [iot]
//! client_id = "${IOT_API_KEY}"
//! client_secret = "${IOT_API_SECRET}"
//! tags = "site=turin"
//!
//! [extraction]
//! resolution = "5 minutes"
//! schedule = "1 hour"
//! aggregation_statistic = "AVG"
//!
//! [destination]
//! bucket = "/srv/telemetry"
//! enable_compression = true
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use schema::{
    parse_tags, ApplicationConfig, DestinationConfig, ExportConfig, ExporterConfig,
    ExtractionConfig, IntervalSetting, IotConfig, LoggingConfig, RetryConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
