//! HTTP client for the Arduino IoT Cloud API
//!
//! Implements [`TelemetryApi`] over the v2 things and series endpoints.

use super::api::{AggregatedBatch, SampledBatch, TelemetryApi};
use super::models::{error_detail, SeriesBatchRequest, SeriesQuery, ThingWire};
use super::token::TokenSource;
use crate::config::IotConfig;
use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::{IotApiError, Result, Thing};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

/// Header carrying the organization (space) id
pub const ORGANIZATION_HEADER: &str = "X-Organization";

/// IoT cloud API client
///
/// # Example
///
/// ```no_run
/// use iot_exporter::adapters::iot::ArduinoIotClient;
/// use iot_exporter::config::IotConfig;
///
/// # fn example() -> iot_exporter::domain::Result<()> {
/// let client = ArduinoIotClient::new(&IotConfig::default())?;
/// println!("Talking to {}", client.base_url());
/// # Ok(())
/// # }
/// ```
pub struct ArduinoIotClient {
    base_url: String,
    client: Client,
    tokens: TokenSource,
    organization_id: Option<String>,
}

impl ArduinoIotClient {
    /// Create a new client from configuration
    ///
    /// No request is made until the first API call.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &IotConfig) -> Result<Self> {
        let base_url = config.effective_api_url().to_string();

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)))
            .user_agent(concat!("iot-exporter/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| IotApiError::ConnectionFailed(format!("failed to build HTTP client: {e}")))?;

        let organization_id = config.organization().map(str::to_string);
        let tokens = TokenSource::new(
            client.clone(),
            &base_url,
            config.client_id.clone(),
            config.client_secret.clone(),
            organization_id.clone(),
        );

        Ok(Self {
            base_url,
            client,
            tokens,
            organization_id,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.token().await?;
        let mut request = request.bearer_auth(token);
        if let Some(org) = &self.organization_id {
            request = request.header(ORGANIZATION_HEADER, org);
        }
        Ok(request)
    }

    /// Sends a request and decodes a JSON body, mapping HTTP failures to
    /// [`IotApiError`]
    async fn send_json<T: DeserializeOwned>(&self, operation: &str, request: RequestBuilder) -> Result<T> {
        let response = self
            .authorized(request)
            .await?
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    IotApiError::Timeout(format!("{operation}: {e}"))
                } else {
                    IotApiError::ConnectionFailed(format!("{operation}: {e}"))
                }
            })?;

        let response = self.check_status(operation, response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| IotApiError::InvalidResponse(format!("{operation}: {e}")).into())
    }

    async fn check_status(&self, operation: &str, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 401 {
            self.tokens.invalidate().await;
        }

        let body = response.text().await.unwrap_or_default();
        let detail = error_detail(&body);
        let message = if detail.is_empty() {
            format!("{operation}: status {}", status.as_u16())
        } else {
            format!("{operation}: status {}: {detail}", status.as_u16())
        };

        tracing::debug!(operation, status = status.as_u16(), detail = %detail, "API request failed");
        Err(IotApiError::from_status(status.as_u16(), message).into())
    }

    async fn batch<T: DeserializeOwned>(
        &self,
        operation: &str,
        path: &str,
        queries: Vec<SeriesQuery>,
    ) -> Result<T> {
        let url = format!("{}/iot/v2/series/{path}", self.base_url);
        let request = self.client.post(&url).json(&SeriesBatchRequest::new(queries));
        self.send_json(operation, request).await
    }
}

/// Renders a tag map in the `key:value` form the things endpoint expects
fn tag_params(tags: &BTreeMap<String, String>) -> Vec<(&'static str, String)> {
    tags.iter()
        .map(|(key, value)| ("tags", format!("{key}:{value}")))
        .collect()
}

#[async_trait]
impl TelemetryApi for ArduinoIotClient {
    async fn list_things(&self, tags: &BTreeMap<String, String>) -> Result<Vec<Thing>> {
        let url = format!("{}/iot/v2/things", self.base_url);
        let request = self
            .client
            .get(&url)
            .query(&[("show_properties", "true")])
            .query(&tag_params(tags));

        let things: Vec<ThingWire> = self.send_json("list_things", request).await?;
        let things: Vec<Thing> = things.into_iter().filter_map(ThingWire::to_domain).collect();

        tracing::debug!(count = things.len(), tags = ?tags, "Listed things");
        Ok(things)
    }

    async fn series_by_thing(
        &self,
        thing_id: &ThingId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval_seconds: i64,
        statistic: &str,
    ) -> Result<AggregatedBatch> {
        let query = SeriesQuery::new(thing_id.series_query(), from, to)
            .with_interval(interval_seconds)
            .with_aggregation(statistic);
        self.batch("series_by_thing", "batch_query", vec![query]).await
    }

    async fn series_string_sampled(
        &self,
        property_ids: &[PropertyId],
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        interval_seconds: i64,
    ) -> Result<SampledBatch> {
        let queries = property_ids
            .iter()
            .map(|id| SeriesQuery::new(id.series_query(), from, to).with_interval(interval_seconds))
            .collect();
        self.batch("series_string_sampled", "batch_query_sampling", queries)
            .await
    }

    async fn series_raw_by_thing(
        &self,
        thing_id: &ThingId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<SampledBatch> {
        let query = SeriesQuery::new(thing_id.series_query(), from, to);
        self.batch("series_raw_by_thing", "batch_query_raw", vec![query])
            .await
    }
}
