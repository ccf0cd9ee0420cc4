//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ExporterConfig, IntervalSetting};
use super::secret::secret_string;
use crate::domain::errors::ExporterError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Environment variable that replaces `iot.api_url`
pub const API_URL_ENV: &str = "IOT_API_URL";

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ExporterConfig
/// 4. Applies environment variable overrides (IOT_EXPORTER_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - A referenced environment variable is not set
/// - Configuration validation fails
///
/// # Examples
///
/// ```no_run
/// use iot_exporter::config::loader::load_config;
///
/// let config = load_config("iot-exporter.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ExporterConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ExporterError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ExporterError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses, overrides and validates configuration text
pub fn parse_config(contents: &str) -> Result<ExporterConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: ExporterConfig = toml::from_str(&contents)?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        ExporterError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ExporterError::Other(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ExporterError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides
///
/// Variables follow the pattern `IOT_EXPORTER_<SECTION>_<KEY>`, for example
/// `IOT_EXPORTER_EXTRACTION_RESOLUTION`. `IOT_API_URL` replaces the API base
/// URL. Unparseable numeric and boolean values are ignored.
fn apply_env_overrides(config: &mut ExporterConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("IOT_EXPORTER_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // IoT API overrides
    if let Ok(val) = std::env::var(API_URL_ENV) {
        config.iot.api_url = val;
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_IOT_CLIENT_ID") {
        config.iot.client_id = val;
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_IOT_CLIENT_SECRET") {
        config.iot.client_secret = secret_string(val);
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_IOT_ORGANIZATION_ID") {
        config.iot.organization_id = Some(val);
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_IOT_TAGS") {
        config.iot.tags = Some(val);
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_IOT_DEV") {
        if let Ok(dev) = val.parse() {
            config.iot.dev = dev;
        }
    }

    // Extraction overrides
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_RESOLUTION") {
        config.extraction.resolution = IntervalSetting::parse(&val);
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_SCHEDULE") {
        config.extraction.schedule = IntervalSetting::parse(&val);
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_AGGREGATION_STATISTIC") {
        config.extraction.aggregation_statistic = val;
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_ALIGN_WITH_TIME_WINDOW") {
        if let Ok(align) = val.parse() {
            config.extraction.align_with_time_window = align;
        }
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_MAX_CONCURRENCY") {
        if let Ok(concurrency) = val.parse() {
            config.extraction.max_concurrency = concurrency;
        }
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_EXTRACTION_OUTPUT_DIR") {
        config.extraction.output_dir = val;
    }

    // Retry overrides
    if let Ok(val) = std::env::var("IOT_EXPORTER_RETRY_MAX_ATTEMPTS") {
        if let Ok(attempts) = val.parse() {
            config.retry.max_attempts = attempts;
        }
    }

    // Destination overrides
    if let Ok(val) = std::env::var("IOT_EXPORTER_DESTINATION_BUCKET") {
        config.destination.bucket = val;
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_DESTINATION_ENABLE_COMPRESSION") {
        if let Ok(enabled) = val.parse() {
            config.destination.enable_compression = enabled;
        }
    }

    // Logging overrides
    if let Ok(val) = std::env::var("IOT_EXPORTER_LOGGING_LOCAL_ENABLED") {
        if let Ok(enabled) = val.parse() {
            config.logging.local_enabled = enabled;
        }
    }
    if let Ok(val) = std::env::var("IOT_EXPORTER_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
