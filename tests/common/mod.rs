//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use iot_exporter::adapters::iot::{
    AggregatedBatch, SampledBatch, SeriesBatch, SeriesResponse, TelemetryApi,
};
use iot_exporter::domain::ids::{PropertyId, ThingId};
use iot_exporter::domain::{
    IotApiError, Property, PropertyType, Result, Thing, UpdateStrategy,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

pub const THING_ID: &str = "91f30213-2bd7-480a-b1dc-f31b01840e7e";
pub const FLOAT_PROPERTY_ID: &str = "c86f4ed9-7f52-4bd3-bdc6-b2936bec68ac";
pub const STRING_PROPERTY_ID: &str = "a86f4ed9-7f52-4bd3-bdc6-b2936bec68bb";

/// Fixed clock used by extraction tests
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, 10, 17, 42).unwrap()
}

pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 10, hour, minute, 0).unwrap()
}

pub fn property(id: &str, name: &str, property_type: &str) -> Property {
    Property {
        id: PropertyId::new(id).unwrap(),
        name: name.to_string(),
        property_type: PropertyType::from(property_type),
        update_strategy: UpdateStrategy::Timed,
        last_value: None,
        value_updated_at: None,
    }
}

pub fn on_change(mut property: Property, last_value: serde_json::Value, updated_at: DateTime<Utc>) -> Property {
    property.update_strategy = UpdateStrategy::OnChange;
    property.last_value = Some(last_value);
    property.value_updated_at = Some(updated_at);
    property
}

pub fn thing(id: &str, name: &str, properties: Vec<Property>) -> Thing {
    Thing {
        id: ThingId::new(id).unwrap(),
        name: name.to_string(),
        properties,
    }
}

/// The thing with one FLOAT and one CHARSTRING property
pub fn sample_thing() -> Thing {
    thing(
        THING_ID,
        "test",
        vec![
            property(FLOAT_PROPERTY_ID, "ptest", "FLOAT"),
            property(STRING_PROPERTY_ID, "pstringVar", "CHARSTRING"),
        ],
    )
}

pub fn things_map(things: Vec<Thing>) -> BTreeMap<ThingId, Thing> {
    things.into_iter().map(|t| (t.id.clone(), t)).collect()
}

pub fn series<V: Clone>(query: String, samples: &[(DateTime<Utc>, V)]) -> SeriesResponse<V> {
    SeriesResponse {
        query,
        property_id: None,
        times: samples.iter().map(|(t, _)| *t).collect(),
        values: samples.iter().map(|(_, v)| v.clone()).collect(),
        count_values: samples.len() as i64,
    }
}

pub fn batch<V>(responses: Vec<SeriesResponse<V>>) -> SeriesBatch<V> {
    SeriesBatch { responses }
}

/// In-memory [`TelemetryApi`] with canned responses
#[derive(Default)]
pub struct StubApi {
    pub things: Vec<Thing>,
    pub aggregated: HashMap<String, AggregatedBatch>,
    pub sampled: HashMap<String, SampledBatch>,
    pub raw: HashMap<String, SampledBatch>,
    /// Thing ids whose series queries fail with a server error
    pub failing: HashSet<String>,
    /// Leading calls answered with a rate limit
    pub rate_limited_calls: AtomicU32,
    /// Delay applied to each series call
    pub latency: Option<Duration>,
    pub calls: Mutex<Vec<String>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl StubApi {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, call: String, thing_id: Option<&ThingId>) -> Result<()> {
        self.calls.lock().unwrap().push(call);

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let limited = self
            .rate_limited_calls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if limited {
            return Err(IotApiError::RateLimited("429 Too Many Requests".to_string()).into());
        }

        if let Some(id) = thing_id {
            if self.failing.contains(id.as_str()) {
                return Err(IotApiError::ServerError {
                    status: 500,
                    message: "internal error".to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TelemetryApi for StubApi {
    async fn list_things(&self, tags: &BTreeMap<String, String>) -> Result<Vec<Thing>> {
        self.calls.lock().unwrap().push(format!("list:{}", tags.len()));
        Ok(self.things.clone())
    }

    async fn series_by_thing(
        &self,
        thing_id: &ThingId,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        interval_seconds: i64,
        statistic: &str,
    ) -> Result<AggregatedBatch> {
        self.enter(
            format!("aggregated:{thing_id}:{interval_seconds}:{statistic}"),
            Some(thing_id),
        )
        .await?;
        Ok(self
            .aggregated
            .get(thing_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn series_string_sampled(
        &self,
        property_ids: &[PropertyId],
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
        interval_seconds: i64,
    ) -> Result<SampledBatch> {
        let ids: Vec<&str> = property_ids.iter().map(PropertyId::as_str).collect();
        self.enter(format!("sampled:{}:{interval_seconds}", ids.join(",")), None)
            .await?;

        let mut responses = Vec::new();
        for id in &ids {
            if let Some(batch) = self.sampled.get(*id) {
                responses.extend(batch.responses.iter().cloned());
            }
        }
        Ok(SeriesBatch { responses })
    }

    async fn series_raw_by_thing(
        &self,
        thing_id: &ThingId,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<SampledBatch> {
        self.enter(format!("raw:{thing_id}"), Some(thing_id)).await?;
        Ok(self.raw.get(thing_id.as_str()).cloned().unwrap_or_default())
    }
}
