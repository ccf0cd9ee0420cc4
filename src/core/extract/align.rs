//! Extraction window alignment
//!
//! Every run exports a half-open `[from, to)` window. `to` is snapped down to
//! a grid so consecutive scheduled runs produce adjacent windows.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Resolutions at or below this are aligned as if they were five minutes
const MIN_ALIGNMENT_RESOLUTION_SECS: i64 = 60;
const DEFAULT_ALIGNMENT_SECS: i64 = 300;

/// Non-window-aligned runs at or below this resolution are shifted back
const SHIFT_THRESHOLD_SECS: i64 = 900;
const LATE_DATA_SHIFT_SECS: i64 = 300;

/// Resolution value that selects raw (non-aggregated) extraction
pub const RAW_RESOLUTION: i64 = -1;

/// Half-open UTC time range `[from, to)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractionWindow {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ExtractionWindow {
    pub fn duration(&self) -> Duration {
        self.to - self.from
    }
}

/// Raw extraction is selected by any non-positive resolution
pub fn is_raw_resolution(resolution_seconds: i64) -> bool {
    resolution_seconds <= 0
}

/// Computes the extraction window for a run started at `now`.
///
/// With `align_to_window` the end is snapped to a multiple of the window
/// length. Otherwise it is snapped to the resolution and, for resolutions up
/// to 15 minutes, moved back five more minutes so late samples are included.
pub fn align(
    resolution_seconds: i64,
    window_minutes: i64,
    align_to_window: bool,
    now: DateTime<Utc>,
) -> ExtractionWindow {
    let resolution = if resolution_seconds <= MIN_ALIGNMENT_RESOLUTION_SECS {
        DEFAULT_ALIGNMENT_SECS
    } else {
        resolution_seconds
    };

    let granularity = if align_to_window {
        window_minutes * 60
    } else {
        resolution
    };

    let mut to = truncate(now, granularity);
    if !align_to_window && resolution <= SHIFT_THRESHOLD_SECS {
        to -= Duration::seconds(LATE_DATA_SHIFT_SECS);
    }

    ExtractionWindow {
        from: to - Duration::minutes(window_minutes),
        to,
    }
}

/// [`align`] against the current wall clock
pub fn align_now(resolution_seconds: i64, window_minutes: i64, align_to_window: bool) -> ExtractionWindow {
    align(resolution_seconds, window_minutes, align_to_window, Utc::now())
}

// Epoch-based truncation, sub-second part dropped
fn truncate(now: DateTime<Utc>, granularity_secs: i64) -> DateTime<Utc> {
    let granularity = granularity_secs.max(1);
    let secs = now.timestamp();
    let truncated = secs - secs.rem_euclid(granularity);
    DateTime::from_timestamp(truncated, 0).unwrap_or(now)
}
