//! Exporter - runs one complete export
//!
//! Lists things, extracts their telemetry into a CSV file, optionally
//! compresses it, and stores it under a date-partitioned key. Partial output
//! is still stored when some things fail; the failures are reported in the
//! summary.

use super::compress::gzip_file;
use super::summary::{ExportError, ExportSummary};
use crate::adapters::iot::{ArduinoIotClient, TelemetryApi};
use crate::adapters::storage::{FilesystemStore, ObjectStore};
use crate::config::ExporterConfig;
use crate::core::extract::sink::file_name;
use crate::core::extract::{CsvSink, ExtractionCoordinator, RetryPolicy, SeriesFetcher};
use crate::domain::ids::ThingId;
use crate::domain::{Result, Thing};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Storage key for the output of a window starting at `window_start`
///
/// `{YYYY-MM-DD}/{YYYY-MM-DD-HH-MM}.csv`, with a `.gz` suffix when compressed.
pub fn object_key(window_start: DateTime<Utc>, compressed: bool) -> String {
    let key = format!("{}/{}", window_start.format("%Y-%m-%d"), file_name(window_start));
    if compressed {
        format!("{key}.gz")
    } else {
        key
    }
}

/// End-to-end export pipeline
pub struct Exporter {
    api: Arc<dyn TelemetryApi>,
    store: Arc<dyn ObjectStore>,
    coordinator: ExtractionCoordinator,
    tags: BTreeMap<String, String>,
    compress: bool,
}

impl Exporter {
    pub fn new(
        api: Arc<dyn TelemetryApi>,
        store: Arc<dyn ObjectStore>,
        coordinator: ExtractionCoordinator,
        tags: BTreeMap<String, String>,
        compress: bool,
    ) -> Self {
        Self {
            api,
            store,
            coordinator,
            tags,
            compress,
        }
    }

    /// Builds the HTTP client, filesystem store and coordinator from
    /// configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ExporterConfig) -> Result<Self> {
        let api: Arc<dyn TelemetryApi> = Arc::new(ArduinoIotClient::new(&config.iot)?);
        let store: Arc<dyn ObjectStore> = Arc::new(FilesystemStore::new(&config.destination.bucket));
        let fetcher = SeriesFetcher::new(Arc::clone(&api), RetryPolicy::from(&config.retry));
        let coordinator = ExtractionCoordinator::new(fetcher, config.extraction_settings());

        Ok(Self::new(
            api,
            store,
            coordinator,
            config.iot.tag_filter(),
            config.destination.enable_compression,
        ))
    }

    /// Runs an export for the window ending now
    pub async fn run(&self) -> Result<ExportSummary> {
        self.run_at(Utc::now()).await
    }

    /// Runs an export for the window aligned against `now`
    ///
    /// # Errors
    ///
    /// Fails when things cannot be listed, the output file cannot be created
    /// or closed, or the upload fails. Per-thing failures do not fail the run.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<ExportSummary> {
        let start_time = Instant::now();
        let mut summary = ExportSummary::new();

        if self.tags.is_empty() {
            tracing::info!("Exporting all things linked to the account");
        } else {
            tracing::info!(tags = ?self.tags, "Filtering things by tags");
        }

        let things = self.api.list_things(&self.tags).await?;
        summary.things_listed = things.len();
        let things = index_things(things);

        let extraction = self.coordinator.extract_at(&things, now).await?;
        summary.window = Some(extraction.window);
        summary.rows_exported = extraction.rows;
        summary.things_processed = extraction.things_processed;
        summary.things_skipped = extraction.things_skipped;
        for failure in &extraction.failures {
            summary.add_thing_failure(failure);
        }

        let stored = self.store_output(&extraction.sink, extraction.window.from).await;
        if let Err(e) = extraction.sink.discard() {
            tracing::warn!(
                path = %extraction.sink.path().display(),
                error = %e,
                "Failed to remove output file"
            );
        }

        match stored {
            Ok(key) => {
                summary.object_key = Some(key);
                summary.compressed = self.compress;
            }
            Err(e) => {
                summary.add_error(ExportError::from(&e));
                summary.with_duration(start_time.elapsed()).log_summary();
                return Err(e);
            }
        }

        if let Some(e) = extraction.error() {
            tracing::error!(error = %e, "Partial data exported");
        }

        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }

    /// Removes working files left by an export for `now` that did not finish
    ///
    /// Used when a run is cancelled by a timeout or a shutdown signal, which
    /// drops it before the output file is discarded. Missing files are ignored.
    pub fn discard_output_at(&self, now: DateTime<Utc>) {
        let path = self.coordinator.output_path(&self.coordinator.window_at(now));
        let mut compressed = path.as_os_str().to_owned();
        compressed.push(".gz");

        for path in [path, PathBuf::from(compressed)] {
            match std::fs::remove_file(&path) {
                Ok(()) => tracing::debug!(path = %path.display(), "Removed unfinished output file"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => remove_failed(&path, &e),
            }
        }
    }

    /// Closes, optionally compresses and uploads the output file
    async fn store_output(&self, sink: &CsvSink, window_start: DateTime<Utc>) -> Result<String> {
        sink.close()?;

        let (upload_path, compressed_copy) = if self.compress {
            tracing::info!(file = %sink.path().display(), "Compressing file");
            let gz = gzip_file(sink.path())?;
            (gz.clone(), Some(gz))
        } else {
            (sink.path().to_path_buf(), None)
        };

        let key = object_key(window_start, self.compress);
        tracing::info!(
            file = %upload_path.display(),
            destination = %self.store.destination(),
            key = %key,
            "Uploading file"
        );
        let result = self.store.write_file(&key, &upload_path).await;

        if let Some(gz) = compressed_copy {
            remove_quietly(&gz);
        }

        result.map(|()| key)
    }
}

/// Keys things by id; a repeated id keeps the last entry
fn index_things(things: Vec<Thing>) -> BTreeMap<ThingId, Thing> {
    let mut indexed = BTreeMap::new();
    for thing in things {
        tracing::debug!(thing_id = %thing.id, name = %thing.name, "Thing");
        indexed.insert(thing.id.clone(), thing);
    }
    indexed
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        remove_failed(path, &e);
    }
}

fn remove_failed(path: &Path, error: &std::io::Error) {
    tracing::warn!(path = %path.display(), error = %error, "Failed to remove temporary file");
}
