//! Concurrent telemetry extraction
//!
//! This module turns the telemetry of a set of things into one CSV file:
//! - [`align`] computes the time window
//! - [`classify`] routes properties by declared type
//! - [`fetch`] queries the API with rate-limit retry
//! - [`compose`] shapes output rows
//! - [`sink`] appends rows to the output file
//! - [`coordinator`] fans out one task per thing

pub mod align;
pub mod classify;
pub mod compose;
pub mod coordinator;
pub mod fetch;
pub mod sink;

pub use align::{align, align_now, is_raw_resolution, ExtractionWindow, RAW_RESOLUTION};
pub use compose::{render_value, AggregationTag, RowShape, SampleRow};
pub use coordinator::{
    Extraction, ExtractionCoordinator, ExtractionSettings, ExtractionState,
    DEFAULT_MAX_CONCURRENCY,
};
pub use fetch::{with_rate_limit_retry, RetryPolicy, SeriesFetcher};
pub use sink::CsvSink;
