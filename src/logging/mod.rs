//! Logging and observability
//!
//! This module provides structured logging with support for:
//! - Human-readable console output
//! - Configurable log levels with `RUST_LOG` override
//! - JSON file logging with rotation
//!
//! # Example
//!
//! ```no_run
//! use iot_exporter::logging::init_logging;
//! use iot_exporter::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

// Re-export commonly used items
pub use structured::{init_logging, LoggingGuard};

/// Log the start of an extraction run
///
/// # Example
///
/// ```no_run
/// use iot_exporter::log_extraction_start;
/// use iot_exporter::core::extract::align_now;
///
/// let window = align_now(300, 60, false);
/// log_extraction_start!(&window, 300, "AVG", 12);
/// ```
#[macro_export]
macro_rules! log_extraction_start {
    ($window:expr, $resolution:expr, $statistic:expr, $things:expr) => {
        tracing::info!(
            from = %$window.from,
            to = %$window.to,
            window_minutes = $window.duration().num_minutes(),
            resolution_seconds = $resolution,
            aggregation = $statistic,
            things = $things,
            "Starting data extraction"
        );
    };
}

/// Log an upstream rate limit before the retry sleep
///
/// # Example
///
/// ```no_run
/// use iot_exporter::log_rate_limited;
///
/// log_rate_limited!("series_by_thing", 1, 5, 1240u64);
/// ```
#[macro_export]
macro_rules! log_rate_limited {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay_ms:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            "Rate limit reached, waiting before retrying"
        );
    };
}
