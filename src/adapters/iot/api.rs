//! Telemetry API capability
//!
//! This module defines the `TelemetryApi` trait that abstracts the IoT cloud
//! thing directory and time-series endpoints. The extraction engine only ever
//! talks to this trait, so tests can substitute an in-memory implementation.

use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::{Result, Thing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One series in a batch response
///
/// `query` echoes the query the series answers (`property.<id>` or
/// `thing.<id>`). `times` and `values` are index-aligned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(bound(deserialize = "V: Deserialize<'de>"))]
pub struct SeriesResponse<V> {
    /// Echoed query
    pub query: String,

    /// Explicit property id, present on thing-scoped responses
    #[serde(default)]
    pub property_id: Option<PropertyId>,

    /// Sample timestamps
    #[serde(default)]
    pub times: Vec<DateTime<Utc>>,

    /// Sample values
    #[serde(default)]
    pub values: Vec<V>,

    /// Number of samples the API reports for this series
    #[serde(default)]
    pub count_values: i64,
}

impl<V> SeriesResponse<V> {
    /// Resolves the property this series belongs to.
    ///
    /// A `property.<id>` echo wins; otherwise the explicit `property_id` is
    /// used. Returns `None` when neither is available.
    pub fn resolve_property_id(&self) -> Option<PropertyId> {
        PropertyId::from_series_query(&self.query).or_else(|| self.property_id.clone())
    }

    /// True when the API reported no samples for this series
    pub fn is_empty(&self) -> bool {
        self.count_values == 0
    }

    /// Iterates `(timestamp, value)` pairs
    pub fn samples(&self) -> impl Iterator<Item = (&DateTime<Utc>, &V)> {
        self.times.iter().zip(self.values.iter())
    }
}

/// Batch of series returned by one API call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesBatch<V> {
    #[serde(default = "Vec::new")]
    pub responses: Vec<SeriesResponse<V>>,
}

impl<V> Default for SeriesBatch<V> {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
        }
    }
}

/// Aggregated numeric series
pub type AggregatedBatch = SeriesBatch<f64>;

/// Sampled or raw series with opaque JSON values
pub type SampledBatch = SeriesBatch<serde_json::Value>;

/// Trait for IoT telemetry API implementations
///
/// # Example
///
/// ```no_run
/// use iot_exporter::adapters::iot::{ArduinoIotClient, TelemetryApi};
/// use iot_exporter::config::IotConfig;
/// use std::collections::BTreeMap;
///
/// # async fn example() -> iot_exporter::domain::Result<()> {
/// let client = ArduinoIotClient::new(&IotConfig::default())?;
/// let things = client.list_things(&BTreeMap::new()).await?;
/// println!("Found {} things", things.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait TelemetryApi: Send + Sync {
    /// List things with their properties
    ///
    /// Only things carrying every `tags` key/value pair are returned. An empty
    /// map returns all things.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response can't be parsed.
    async fn list_things(&self, tags: &BTreeMap<String, String>) -> Result<Vec<Thing>>;

    /// Aggregated numeric series for every property of a thing
    ///
    /// # Arguments
    ///
    /// * `thing_id` - Thing to query
    /// * `from`, `to` - Half-open time range
    /// * `interval_seconds` - Aggregation bucket width
    /// * `statistic` - Aggregation statistic (`AVG`, `MIN`, `MAX`, ...)
    ///
    /// # Errors
    ///
    /// Rate limiting is reported as [`crate::domain::IotApiError::RateLimited`],
    /// which callers may retry.
    async fn series_by_thing(
        &self,
        thing_id: &ThingId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval_seconds: i64,
        statistic: &str,
    ) -> Result<AggregatedBatch>;

    /// Sampled series for string-like properties
    ///
    /// # Errors
    ///
    /// Same error contract as [`TelemetryApi::series_by_thing`].
    async fn series_string_sampled(
        &self,
        property_ids: &[PropertyId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval_seconds: i64,
    ) -> Result<SampledBatch>;

    /// Raw, non-aggregated series for every property of a thing
    ///
    /// # Errors
    ///
    /// Same error contract as [`TelemetryApi::series_by_thing`].
    async fn series_raw_by_thing(
        &self,
        thing_id: &ThingId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SampledBatch>;
}
