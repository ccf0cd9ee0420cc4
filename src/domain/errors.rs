//! Domain error types
//!
//! This module defines the error hierarchy for the exporter. Errors are
//! domain-specific and don't expose third-party client types.

use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Telemetry API errors
    #[error("IoT API error: {0}")]
    Iot(#[from] IotApiError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Output file (CSV sink) errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// One or more things failed during extraction
    #[error("Errors detected during data export: {failed} of {total} things failed")]
    Extraction { failed: usize, total: usize },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExporterError {
    /// Whether the failed operation may succeed if attempted again.
    ///
    /// Only upstream rate limiting is considered retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExporterError::Iot(err) if err.is_retryable())
    }
}

/// Telemetry API errors
///
/// Errors that occur when talking to the IoT cloud API.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Error)]
pub enum IotApiError {
    /// Failed to reach the API
    #[error("Failed to connect to IoT API: {0}")]
    ConnectionFailed(String),

    /// Credentials rejected or token unavailable
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Request quota exceeded (HTTP 429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Response body could not be understood
    #[error("Invalid response from server: {0}")]
    InvalidResponse(String),

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

impl IotApiError {
    /// True only for rate-limit responses.
    pub fn is_retryable(&self) -> bool {
        matches!(self, IotApiError::RateLimited(_))
    }

    /// Maps a non-success HTTP status and its detail message to an error.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => IotApiError::RateLimited(message),
            401 | 403 => IotApiError::AuthenticationFailed(message),
            408 | 504 => IotApiError::Timeout(message),
            400..=499 => IotApiError::ClientError { status, message },
            _ => IotApiError::ServerError { status, message },
        }
    }
}

/// Failure of a single thing's extraction task
#[derive(Debug, Clone)]
pub struct ThingFailure {
    /// Thing that failed
    pub thing_id: String,

    /// Thing display name
    pub thing_name: String,

    /// Extraction stage that failed (aggregated, sampled, raw, last_value)
    pub stage: String,

    /// Error message
    pub message: String,
}

impl ThingFailure {
    /// Creates a new thing failure
    pub fn new(
        thing_id: impl Into<String>,
        thing_name: impl Into<String>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            thing_id: thing_id.into(),
            thing_name: thing_name.into(),
            stage: stage.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ThingFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "thing {} [{}] failed during {}: {}",
            self.thing_id, self.thing_name, self.stage, self.message
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

// Conversion from csv writer errors
impl From<csv::Error> for ExporterError {
    fn from(err: csv::Error) -> Self {
        ExporterError::Sink(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::Configuration(format!("TOML parse error: {err}"))
    }
}
