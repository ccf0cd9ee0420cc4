//! Configuration schema types
//!
//! This module defines the configuration structure for the IoT exporter.

use crate::config::SecretString;
use crate::core::extract::{ExtractionSettings, RAW_RESOLUTION};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

/// Production IoT cloud API
pub const DEFAULT_API_URL: &str = "https://api2.arduino.cc";

/// Development IoT cloud API, selected by `iot.dev = true`
pub const DEV_API_URL: &str = "https://api2.oniudra.cc";

/// Resolution used when none (or an unknown label) is configured
pub const DEFAULT_RESOLUTION_SECONDS: i64 = 300;

/// Largest aggregation resolution the API supports
pub const MAX_RESOLUTION_SECONDS: i64 = 3600;

/// Extraction window used when none (or an unknown label) is configured
pub const DEFAULT_WINDOW_MINUTES: i64 = 60;

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// IoT cloud API connection
    pub iot: IotConfig,

    /// What to extract and how
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Rate-limit retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Where finished files are stored
    pub destination: DestinationConfig,

    /// Whole-run settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExporterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.iot.validate()?;
        self.extraction.validate()?;
        self.retry.validate()?;
        self.destination.validate()?;
        self.export.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Extraction parameters with resolution and window resolved
    pub fn extraction_settings(&self) -> ExtractionSettings {
        ExtractionSettings {
            resolution_seconds: self.extraction.effective_resolution_seconds(),
            window_minutes: self.extraction.window_minutes(),
            aggregation_statistic: self.extraction.aggregation_statistic.clone(),
            align_with_time_window: self.extraction.align_with_time_window,
            max_concurrency: self.extraction.max_concurrency,
            output_dir: PathBuf::from(&self.extraction.output_dir),
        }
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
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
        }
    }
}

/// IoT cloud API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IotConfig {
    /// API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// OAuth client id
    #[serde(default)]
    pub client_id: String,

    /// OAuth client secret
    /// Stored securely in memory and automatically zeroized on drop
    pub client_secret: SecretString,

    /// Organization (space) id, sent as `X-Organization`
    #[serde(default)]
    pub organization_id: Option<String>,

    /// Thing filter, `key=value` pairs separated by commas
    #[serde(default)]
    pub tags: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Use the development API
    #[serde(default)]
    pub dev: bool,
}

impl IotConfig {
    fn validate(&self) -> Result<(), String> {
        if self.client_id.trim().is_empty() {
            return Err("iot.client_id cannot be empty".to_string());
        }

        if self.client_secret.expose_secret().is_empty() {
            return Err("iot.client_secret cannot be empty".to_string());
        }

        let url = Url::parse(&self.api_url)
            .map_err(|e| format!("iot.api_url '{}' is not a valid URL: {e}", self.api_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!(
                "iot.api_url must start with http:// or https://, got '{}'",
                self.api_url
            ));
        }

        if self.timeout_seconds == 0 {
            return Err("iot.timeout_seconds must be > 0".to_string());
        }

        Ok(())
    }

    /// Base URL requests go to
    pub fn effective_api_url(&self) -> &str {
        if self.dev {
            DEV_API_URL
        } else {
            self.api_url.trim_end_matches('/')
        }
    }

    /// Tag filter as a map
    pub fn tag_filter(&self) -> BTreeMap<String, String> {
        self.tags.as_deref().map(parse_tags).unwrap_or_default()
    }

    /// Organization id, if set and non-blank
    pub fn organization(&self) -> Option<&str> {
        self.organization_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

impl Default for IotConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            client_id: String::new(),
            client_secret: crate::config::secret_string(String::new()),
            organization_id: None,
            tags: None,
            timeout_seconds: default_timeout_seconds(),
            dev: false,
        }
    }
}

/// Parses `k1=v1,k2=v2` into a map.
///
/// Keys and values are trimmed; pairs without `=` or with an empty key are
/// ignored.
pub fn parse_tags(tags: &str) -> BTreeMap<String, String> {
    tags.split(',')
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Interval given either as a number or as a label like `"5 minutes"`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntervalSetting {
    Number(i64),
    Label(String),
}

impl IntervalSetting {
    /// Builds a setting from a string, keeping numeric strings as numbers
    pub fn parse(value: &str) -> Self {
        match value.trim().parse::<i64>() {
            Ok(n) => IntervalSetting::Number(n),
            Err(_) => IntervalSetting::Label(value.trim().to_string()),
        }
    }
}

/// Extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Sample resolution in seconds, or `raw`, `1 minute`, `5 minutes`,
    /// `15 minutes`, `1 hour`
    #[serde(default = "default_resolution")]
    pub resolution: IntervalSetting,

    /// Extraction window in minutes, or `5 minutes`, `15 minutes`, `1 hour`,
    /// `1 day`
    #[serde(default = "default_schedule")]
    pub schedule: IntervalSetting,

    /// Aggregation statistic for numeric properties
    #[serde(default = "default_aggregation_statistic")]
    pub aggregation_statistic: String,

    /// Align the window end to a multiple of the window length
    #[serde(default)]
    pub align_with_time_window: bool,

    /// Things extracted concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Directory for the working CSV file
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl ExtractionConfig {
    fn validate(&self) -> Result<(), String> {
        let resolution = self.resolution_seconds();
        if resolution > MAX_RESOLUTION_SECONDS {
            return Err(format!(
                "extraction.resolution {resolution} is invalid. Must be raw or at most {MAX_RESOLUTION_SECONDS} seconds"
            ));
        }

        if self.window_minutes() <= 0 {
            return Err("extraction.schedule must be > 0 minutes".to_string());
        }

        let statistic = self.aggregation_statistic.as_str();
        if statistic.is_empty()
            || !statistic
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "Invalid extraction.aggregation_statistic '{statistic}'. Expected an upper-case statistic such as AVG, MIN, MAX"
            ));
        }

        if self.max_concurrency == 0 || self.max_concurrency > 100 {
            return Err("extraction.max_concurrency must be between 1 and 100".to_string());
        }

        if self.output_dir.trim().is_empty() {
            return Err("extraction.output_dir cannot be empty".to_string());
        }

        Ok(())
    }

    /// Configured resolution in seconds, negative for raw
    pub fn resolution_seconds(&self) -> i64 {
        match &self.resolution {
            IntervalSetting::Number(seconds) => *seconds,
            IntervalSetting::Label(label) => match label.as_str() {
                "raw" => RAW_RESOLUTION,
                "1 minute" => 60,
                "5 minutes" => 300,
                "15 minutes" => 900,
                "1 hour" => 3600,
                other => {
                    tracing::warn!(
                        resolution = other,
                        default = DEFAULT_RESOLUTION_SECONDS,
                        "Unknown resolution, using default"
                    );
                    DEFAULT_RESOLUTION_SECONDS
                }
            },
        }
    }

    /// Extraction window length in minutes
    pub fn window_minutes(&self) -> i64 {
        match &self.schedule {
            IntervalSetting::Number(minutes) => *minutes,
            IntervalSetting::Label(label) => match label.as_str() {
                "5 minutes" => 5,
                "15 minutes" => 15,
                "1 hour" => 60,
                "1 day" => 24 * 60,
                other => {
                    tracing::warn!(
                        schedule = other,
                        default = DEFAULT_WINDOW_MINUTES,
                        "Unknown schedule, using default"
                    );
                    DEFAULT_WINDOW_MINUTES
                }
            },
        }
    }

    /// Resolution actually queried.
    ///
    /// Windows longer than an hour need at least five minute resolution, so
    /// one minute and raw are raised to five minutes there.
    pub fn effective_resolution_seconds(&self) -> i64 {
        let resolution = self.resolution_seconds();
        if self.window_minutes() > 60 && resolution <= 60 {
            tracing::warn!(
                resolution,
                window_minutes = self.window_minutes(),
                "Resolution must be greater than 60 seconds for time windows greater than 60 minutes. Using 5 minutes"
            );
            return DEFAULT_RESOLUTION_SECONDS;
        }
        resolution
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            resolution: default_resolution(),
            schedule: default_schedule(),
            aggregation_statistic: default_aggregation_statistic(),
            align_with_time_window: false,
            max_concurrency: default_max_concurrency(),
            output_dir: default_output_dir(),
        }
    }
}

/// Retry configuration for rate-limited API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per call, first one included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed part of the delay between attempts, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Upper bound of the random part of the delay, in milliseconds
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl RetryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 || self.max_attempts > 20 {
            return Err("retry.max_attempts must be between 1 and 20".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

/// Destination configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Bucket root directory
    pub bucket: String,

    /// Gzip files before storing them
    #[serde(default)]
    pub enable_compression: bool,
}

impl DestinationConfig {
    fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("destination.bucket cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Whole-run export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Deadline for a complete export run
    #[serde(default = "default_export_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl ExportConfig {
    fn validate(&self) -> Result<(), String> {
        if self.timeout_seconds == 0 {
            return Err("export.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_export_timeout_seconds(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local JSON file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_resolution() -> IntervalSetting {
    IntervalSetting::Number(DEFAULT_RESOLUTION_SECONDS)
}

fn default_schedule() -> IntervalSetting {
    IntervalSetting::Number(DEFAULT_WINDOW_MINUTES)
}

fn default_aggregation_statistic() -> String {
    "AVG".to_string()
}

fn default_max_concurrency() -> usize {
    crate::core::extract::DEFAULT_MAX_CONCURRENCY
}

fn default_output_dir() -> String {
    std::env::temp_dir().display().to_string()
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_jitter_ms() -> u64 {
    500
}

fn default_export_timeout_seconds() -> u64 {
    900
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
