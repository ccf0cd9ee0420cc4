//! Export summary and reporting
//!
//! This module defines structures for tracking and reporting export results.

use crate::core::extract::ExtractionWindow;
use crate::domain::{ExporterError, IotApiError, ThingFailure};
use std::time::Duration;

/// Summary of an export run
#[derive(Debug, Clone)]
pub struct ExportSummary {
    /// Things returned by the directory query
    pub things_listed: usize,

    /// Things an extraction task ran for
    pub things_processed: usize,

    /// Things skipped for having no properties
    pub things_skipped: usize,

    /// Things whose extraction failed
    pub things_failed: usize,

    /// Rows written to the output file
    pub rows_exported: usize,

    /// Extracted time window
    pub window: Option<ExtractionWindow>,

    /// Key the output was stored under
    pub object_key: Option<String>,

    /// Whether the stored file is gzip-compressed
    pub compressed: bool,

    /// Duration of the export
    pub duration: Duration,

    /// Errors encountered during export
    pub errors: Vec<ExportError>,
}

impl ExportSummary {
    /// Create a new empty export summary
    pub fn new() -> Self {
        Self {
            things_listed: 0,
            things_processed: 0,
            things_skipped: 0,
            things_failed: 0,
            rows_exported: 0,
            window: None,
            object_key: None,
            compressed: false,
            duration: Duration::from_secs(0),
            errors: Vec::new(),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Add an error
    pub fn add_error(&mut self, error: ExportError) {
        self.errors.push(error);
    }

    /// Record a failed thing
    pub fn add_thing_failure(&mut self, failure: &ThingFailure) {
        self.things_failed += 1;
        self.add_error(
            ExportError::new(ExportErrorType::Extraction, failure.message.clone())
                .with_context(format!(
                    "thing_id={} stage={}",
                    failure.thing_id, failure.stage
                )),
        );
    }

    /// Check if the export was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.things_failed == 0 && self.errors.is_empty()
    }

    /// Share of processed things extracted without error, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.things_processed == 0 {
            return 100.0;
        }
        let succeeded = self.things_processed.saturating_sub(self.things_failed);
        (succeeded as f64 / self.things_processed as f64) * 100.0
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            things_listed = self.things_listed,
            things_processed = self.things_processed,
            things_skipped = self.things_skipped,
            things_failed = self.things_failed,
            rows = self.rows_exported,
            object_key = self.object_key.as_deref().unwrap_or("-"),
            compressed = self.compressed,
            duration_secs = self.duration.as_secs(),
            success_rate = format!("{:.2}%", self.success_rate()),
            "Export completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(
                error_count = self.errors.len(),
                "Export completed with errors"
            );
            for error in &self.errors {
                tracing::warn!(
                    error_type = ?error.error_type,
                    message = %error.message,
                    context = error.context.as_deref().unwrap_or("-"),
                    "Export error"
                );
            }
        }
    }
}

impl Default for ExportSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// Type of export error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportErrorType {
    /// IoT API unreachable or timing out
    Connection,
    /// Credentials rejected
    Authentication,
    /// A thing's extraction failed
    Extraction,
    /// Output file error
    Sink,
    /// Upload error
    Storage,
    /// Configuration error
    Configuration,
    /// Unknown error
    Unknown,
}

impl From<&ExporterError> for ExportErrorType {
    fn from(error: &ExporterError) -> Self {
        match error {
            ExporterError::Iot(IotApiError::AuthenticationFailed(_))
            | ExporterError::Authentication(_) => ExportErrorType::Authentication,
            ExporterError::Iot(IotApiError::ConnectionFailed(_))
            | ExporterError::Iot(IotApiError::Timeout(_)) => ExportErrorType::Connection,
            ExporterError::Iot(_) | ExporterError::Extraction { .. } => {
                ExportErrorType::Extraction
            }
            ExporterError::Sink(_) | ExporterError::Io(_) => ExportErrorType::Sink,
            ExporterError::Storage(_) => ExportErrorType::Storage,
            ExporterError::Configuration(_) | ExporterError::Validation(_) => {
                ExportErrorType::Configuration
            }
            ExporterError::Serialization(_) | ExporterError::Other(_) => ExportErrorType::Unknown,
        }
    }
}

/// Export error with context
#[derive(Debug, Clone)]
pub struct ExportError {
    /// Type of error
    pub error_type: ExportErrorType,

    /// Error message
    pub message: String,

    /// Optional context (e.g., thing ID, object key)
    pub context: Option<String>,
}

impl ExportError {
    /// Create a new export error
    pub fn new(error_type: ExportErrorType, message: String) -> Self {
        Self {
            error_type,
            message,
            context: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: String) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<&ExporterError> for ExportError {
    fn from(error: &ExporterError) -> Self {
        ExportError::new(ExportErrorType::from(error), error.to_string())
    }
}
