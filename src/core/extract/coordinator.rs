//! Extraction coordination
//!
//! This module fans out one task per thing, bounded by a semaphore, and
//! gathers per-thing failures without letting one thing affect another.

use super::align::{align, is_raw_resolution, ExtractionWindow};
use super::classify::{is_last_value_eligible, is_string_like};
use super::compose::{render_float, render_value, AggregationTag, RowShape, SampleRow};
use super::fetch::SeriesFetcher;
use super::sink::{file_name, CsvSink};
use crate::adapters::iot::SeriesResponse;
use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::{ExporterError, Result, Thing, ThingFailure};
use crate::log_extraction_start;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

/// Default number of things extracted concurrently
pub const DEFAULT_MAX_CONCURRENCY: usize = 10;

/// Parameters of one extraction run
#[derive(Debug, Clone)]
pub struct ExtractionSettings {
    /// Aggregation resolution, non-positive for raw
    pub resolution_seconds: i64,
    pub window_minutes: i64,
    pub aggregation_statistic: String,
    pub align_with_time_window: bool,
    pub max_concurrency: usize,
    /// Directory receiving the output file
    pub output_dir: PathBuf,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        Self {
            resolution_seconds: 300,
            window_minutes: 60,
            aggregation_statistic: "AVG".to_string(),
            align_with_time_window: false,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            output_dir: std::env::temp_dir(),
        }
    }
}

impl ExtractionSettings {
    pub fn is_raw(&self) -> bool {
        is_raw_resolution(self.resolution_seconds)
    }

    pub fn row_shape(&self) -> RowShape {
        RowShape::for_raw(self.is_raw())
    }
}

/// Lifecycle of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionState {
    Initialized,
    Aligning,
    FanningOut,
    Joining,
    Finalized,
    FinalizedWithErrors,
}

impl fmt::Display for ExtractionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExtractionState::Initialized => "initialized",
            ExtractionState::Aligning => "aligning",
            ExtractionState::FanningOut => "fanning_out",
            ExtractionState::Joining => "joining",
            ExtractionState::Finalized => "finalized",
            ExtractionState::FinalizedWithErrors => "finalized_with_errors",
        };
        f.write_str(s)
    }
}

/// Outcome of an extraction run
///
/// The sink is still open; the caller closes, uploads and discards it.
#[derive(Debug)]
pub struct Extraction {
    pub sink: Arc<CsvSink>,
    pub window: ExtractionWindow,
    /// Rows written across all things
    pub rows: usize,
    /// Things that were extracted (successfully or not)
    pub things_processed: usize,
    /// Things skipped for having no properties
    pub things_skipped: usize,
    pub failures: Vec<ThingFailure>,
    pub state: ExtractionState,
}

impl Extraction {
    /// Aggregate error when at least one thing failed
    pub fn error(&self) -> Option<ExporterError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(ExporterError::Extraction {
                failed: self.failures.len(),
                total: self.things_processed,
            })
        }
    }

    pub fn is_complete(&self) -> bool {
        self.state == ExtractionState::Finalized
    }
}

/// Runs bounded, failure-isolated extraction of a set of things
pub struct ExtractionCoordinator {
    fetcher: SeriesFetcher,
    settings: Arc<ExtractionSettings>,
}

impl ExtractionCoordinator {
    pub fn new(fetcher: SeriesFetcher, settings: ExtractionSettings) -> Self {
        Self {
            fetcher,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ExtractionSettings {
        &self.settings
    }

    /// Window extracted for `now`
    pub fn window_at(&self, now: DateTime<Utc>) -> ExtractionWindow {
        align(
            self.settings.resolution_seconds,
            self.settings.window_minutes,
            self.settings.align_with_time_window,
            now,
        )
    }

    /// Path of the output file written for `window`
    pub fn output_path(&self, window: &ExtractionWindow) -> PathBuf {
        self.settings.output_dir.join(file_name(window.from))
    }

    /// Extracts the window ending before the current time
    pub async fn extract(&self, things: &BTreeMap<ThingId, Thing>) -> Result<Extraction> {
        self.extract_at(things, Utc::now()).await
    }

    /// Extracts the window computed for `now`.
    ///
    /// Only failing to create the output file is returned as `Err`. Thing
    /// failures are reported in [`Extraction::failures`].
    pub async fn extract_at(
        &self,
        things: &BTreeMap<ThingId, Thing>,
        now: DateTime<Utc>,
    ) -> Result<Extraction> {
        let settings = &self.settings;
        let mut state = ExtractionState::Initialized;

        advance(&mut state, ExtractionState::Aligning);
        let window = self.window_at(now);

        let sink = Arc::new(CsvSink::create(
            &settings.output_dir,
            window.from,
            settings.row_shape(),
        )?);

        let aggregation = if settings.is_raw() {
            "raw"
        } else {
            settings.aggregation_statistic.as_str()
        };
        log_extraction_start!(&window, settings.resolution_seconds, aggregation, things.len());

        advance(&mut state, ExtractionState::FanningOut);
        let semaphore = Arc::new(Semaphore::new(settings.max_concurrency.max(1)));
        let (error_tx, mut error_rx) = mpsc::unbounded_channel::<ThingFailure>();
        let mut tasks = JoinSet::new();
        let mut things_skipped = 0;

        for thing in things.values() {
            if !thing.has_properties() {
                tracing::warn!(thing_id = %thing.id, "Skipping thing with no properties");
                things_skipped += 1;
                continue;
            }

            let task = ThingExtraction {
                fetcher: self.fetcher.clone(),
                sink: Arc::clone(&sink),
                settings: Arc::clone(settings),
                window,
                thing: thing.clone(),
            };
            let semaphore = Arc::clone(&semaphore);
            let errors = error_tx.clone();

            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let _ = errors.send(task.failure(Stage::Admission, e.to_string()));
                        return 0;
                    }
                };
                task.run(&errors).await
            });
        }
        drop(error_tx);
        let things_processed = tasks.len();

        advance(&mut state, ExtractionState::Joining);
        tracing::info!(tasks = things_processed, "Waiting for all data extraction jobs to terminate");

        let mut rows = 0;
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(written) => rows += written,
                Err(e) => failures.push(ThingFailure::new("", "", "task", e.to_string())),
            }
        }
        while let Some(failure) = error_rx.recv().await {
            failures.push(failure);
        }

        for failure in &failures {
            tracing::error!(
                thing_id = %failure.thing_id,
                thing_name = %failure.thing_name,
                stage = %failure.stage,
                error = %failure.message,
                "Thing extraction failed"
            );
        }

        let final_state = if failures.is_empty() {
            ExtractionState::Finalized
        } else {
            ExtractionState::FinalizedWithErrors
        };
        advance(&mut state, final_state);

        tracing::info!(
            rows,
            things = things_processed,
            skipped = things_skipped,
            failed = failures.len(),
            "Data extraction finished"
        );

        Ok(Extraction {
            sink,
            window,
            rows,
            things_processed,
            things_skipped,
            failures,
            state,
        })
    }
}

fn advance(state: &mut ExtractionState, next: ExtractionState) {
    tracing::debug!(from = %state, to = %next, "Extraction state transition");
    *state = next;
}

/// Step of a thing's extraction, reported with failures
#[derive(Debug, Clone, Copy)]
enum Stage {
    Admission,
    Raw,
    Aggregated,
    Sampled,
    LastValue,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Admission => "admission",
            Stage::Raw => "raw",
            Stage::Aggregated => "aggregated",
            Stage::Sampled => "sampled",
            Stage::LastValue => "last_value",
        };
        f.write_str(s)
    }
}

/// Per-thing task state
struct ThingExtraction {
    fetcher: SeriesFetcher,
    sink: Arc<CsvSink>,
    settings: Arc<ExtractionSettings>,
    window: ExtractionWindow,
    thing: Thing,
}

/// Rows collected by one primary path plus the properties they cover
#[derive(Default)]
struct Collected {
    rows: Vec<SampleRow>,
    seen: HashSet<(PropertyId, DateTime<Utc>)>,
}

impl Collected {
    fn push(&mut self, row: SampleRow) {
        if self.seen.insert((row.property_id.clone(), row.timestamp)) {
            self.rows.push(row);
        }
    }

    fn populated(&self) -> HashSet<PropertyId> {
        self.seen.iter().map(|(id, _)| id.clone()).collect()
    }
}

impl ThingExtraction {
    /// Runs every stage, reporting the first failure. Returns rows written.
    async fn run(self, errors: &mpsc::UnboundedSender<ThingFailure>) -> usize {
        let mut collected = Collected::default();
        let mut written = 0;

        if let Err((stage, e)) = self.primary(&mut collected, &mut written).await {
            let _ = errors.send(self.failure(stage, e.to_string()));
            return written;
        }

        let fallback = self.last_value_rows(&collected.populated());
        match self.sink.write(&fallback) {
            Ok(n) => {
                if n > 0 {
                    tracing::debug!(thing_id = %self.thing.id, rows = n, "Saved last value samples");
                }
                written += n;
            }
            Err(e) => {
                let _ = errors.send(self.failure(Stage::LastValue, e.to_string()));
            }
        }
        written
    }

    async fn primary(
        &self,
        collected: &mut Collected,
        written: &mut usize,
    ) -> std::result::Result<(), (Stage, ExporterError)> {
        if self.settings.is_raw() {
            let batch = self
                .fetcher
                .fetch_raw(&self.thing.id, &self.window)
                .await
                .map_err(|e| (Stage::Raw, e))?;
            *written += self
                .collect_opaque(&batch.responses, AggregationTag::None, collected)
                .map_err(|e| (Stage::Raw, e))?;
            return Ok(());
        }

        let statistic = &self.settings.aggregation_statistic;
        let batch = self
            .fetcher
            .fetch_aggregated(
                &self.thing.id,
                &self.window,
                self.settings.resolution_seconds,
                statistic,
            )
            .await
            .map_err(|e| (Stage::Aggregated, e))?;
        *written += self
            .collect_numeric(&batch.responses, statistic, collected)
            .map_err(|e| (Stage::Aggregated, e))?;

        let string_properties: Vec<PropertyId> = self
            .thing
            .properties
            .iter()
            .filter(|p| is_string_like(&p.property_type))
            .map(|p| p.id.clone())
            .collect();
        if string_properties.is_empty() {
            return Ok(());
        }

        let batch = self
            .fetcher
            .fetch_string_sampled(
                &string_properties,
                &self.window,
                self.settings.resolution_seconds,
            )
            .await
            .map_err(|e| (Stage::Sampled, e))?;
        *written += self
            .collect_opaque(&batch.responses, AggregationTag::None, collected)
            .map_err(|e| (Stage::Sampled, e))?;
        Ok(())
    }

    fn collect_numeric(
        &self,
        responses: &[SeriesResponse<f64>],
        statistic: &str,
        collected: &mut Collected,
    ) -> Result<usize> {
        let start = collected.rows.len();
        for response in responses {
            let Some(property_id) = self.property_of(response) else {
                continue;
            };
            for (ts, value) in response.samples() {
                collected.push(SampleRow::for_property(
                    &self.thing,
                    &property_id,
                    *ts,
                    render_float(*value),
                    AggregationTag::Statistic(statistic.to_string()),
                ));
            }
        }
        self.sink.write(&collected.rows[start..])
    }

    fn collect_opaque(
        &self,
        responses: &[SeriesResponse<serde_json::Value>],
        tag: AggregationTag,
        collected: &mut Collected,
    ) -> Result<usize> {
        let start = collected.rows.len();
        for response in responses {
            let Some(property_id) = self.property_of(response) else {
                continue;
            };
            for (ts, value) in response.samples() {
                let Some(rendered) = render_value(value) else {
                    continue;
                };
                collected.push(SampleRow::for_property(
                    &self.thing,
                    &property_id,
                    *ts,
                    rendered,
                    tag.clone(),
                ));
            }
        }
        self.sink.write(&collected.rows[start..])
    }

    /// Property a non-empty response belongs to
    fn property_of<V>(&self, response: &SeriesResponse<V>) -> Option<PropertyId> {
        if response.is_empty() {
            return None;
        }
        let property_id = response.resolve_property_id();
        match &property_id {
            Some(id) => tracing::debug!(
                thing_id = %self.thing.id,
                property_id = %id,
                values = response.count_values,
                "Series received"
            ),
            None => tracing::warn!(
                thing_id = %self.thing.id,
                query = %response.query,
                "Skipping series without a property id"
            ),
        }
        property_id
    }

    /// Rows from cached last values of eligible, unpopulated properties
    fn last_value_rows(&self, populated: &HashSet<PropertyId>) -> Vec<SampleRow> {
        let raw = self.settings.is_raw();
        self.thing
            .properties
            .iter()
            .filter(|p| is_last_value_eligible(p) && !populated.contains(&p.id))
            .filter_map(|p| {
                let updated_at = p.value_updated_at?;
                let value = render_value(p.last_value.as_ref()?)?;
                let tag = if raw {
                    AggregationTag::None
                } else {
                    AggregationTag::LastValue
                };
                Some(SampleRow::for_property(&self.thing, &p.id, updated_at, value, tag))
            })
            .collect()
    }

    fn failure(&self, stage: Stage, message: String) -> ThingFailure {
        ThingFailure::new(
            self.thing.id.as_str(),
            self.thing.name.as_str(),
            stage.to_string(),
            message,
        )
    }
}
