//! Series fetching with rate-limit retry
//!
//! [`SeriesFetcher`] issues the three query shapes against a
//! [`TelemetryApi`]. Each call goes through [`with_rate_limit_retry`], which
//! retries only while the API reports rate limiting.

use super::align::ExtractionWindow;
use crate::adapters::iot::{AggregatedBatch, SampledBatch, TelemetryApi};
use crate::config::RetryConfig;
use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::Result;
use crate::log_rate_limited;
use rand::Rng;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Smallest aggregation interval the API accepts
pub const MIN_AGGREGATION_INTERVAL_SECS: i64 = 60;

/// Attempt budget and delay bounds for rate-limited calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Upper bound of the random extra delay (exclusive)
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(1000),
            jitter: Duration::from_millis(500),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            base_delay: Duration::from_millis(config.base_delay_ms),
            jitter: Duration::from_millis(config.jitter_ms),
        }
    }
}

impl RetryPolicy {
    /// Base delay plus a random share of the jitter
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        self.base_delay + Duration::from_millis(extra)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the attempt budget is spent.
///
/// The last error is returned on exhaustion.
pub async fn with_rate_limit_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_retryable() && attempt < max_attempts => {
                let delay = policy.next_delay();
                log_rate_limited!(operation_name, attempt, max_attempts, delay.as_millis() as u64);
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Shape-specific series queries with retry
#[derive(Clone)]
pub struct SeriesFetcher {
    api: Arc<dyn TelemetryApi>,
    policy: RetryPolicy,
}

impl SeriesFetcher {
    pub fn new(api: Arc<dyn TelemetryApi>, policy: RetryPolicy) -> Self {
        Self { api, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Aggregated numeric series for every property of a thing.
    ///
    /// The interval is clamped to at least one minute.
    pub async fn fetch_aggregated(
        &self,
        thing_id: &ThingId,
        window: &ExtractionWindow,
        resolution_seconds: i64,
        statistic: &str,
    ) -> Result<AggregatedBatch> {
        let interval = resolution_seconds.max(MIN_AGGREGATION_INTERVAL_SECS);
        with_rate_limit_retry(&self.policy, "series_by_thing", || {
            self.api
                .series_by_thing(thing_id, window.from, window.to, interval, statistic)
        })
        .await
    }

    /// Sampled series for string-like properties.
    ///
    /// An empty id list yields an empty batch without calling the API.
    pub async fn fetch_string_sampled(
        &self,
        property_ids: &[PropertyId],
        window: &ExtractionWindow,
        resolution_seconds: i64,
    ) -> Result<SampledBatch> {
        if property_ids.is_empty() {
            return Ok(SampledBatch::default());
        }
        with_rate_limit_retry(&self.policy, "series_string_sampled", || {
            self.api.series_string_sampled(
                property_ids,
                window.from,
                window.to,
                resolution_seconds,
            )
        })
        .await
    }

    /// Raw series for every property of a thing
    pub async fn fetch_raw(
        &self,
        thing_id: &ThingId,
        window: &ExtractionWindow,
    ) -> Result<SampledBatch> {
        with_rate_limit_retry(&self.policy, "series_raw_by_thing", || {
            self.api.series_raw_by_thing(thing_id, window.from, window.to)
        })
        .await
    }
}
