//! IoT cloud API models
//!
//! Request and response structures for the IoT cloud REST API. These are
//! kept apart from the domain types and converted at the adapter boundary.

use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::{Property, PropertyType, Thing, UpdateStrategy};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Thing as returned by `GET /iot/v2/things`
#[derive(Debug, Clone, Deserialize)]
pub struct ThingWire {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub properties: Option<Vec<PropertyWire>>,
}

/// Property entry inside a [`ThingWire`]
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyWire {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub property_type: String,
    #[serde(default)]
    pub update_strategy: String,
    #[serde(default)]
    pub last_value: Option<serde_json::Value>,
    #[serde(default)]
    pub value_updated_at: Option<DateTime<Utc>>,
}

impl ThingWire {
    /// Convert to a domain [`Thing`]
    ///
    /// Returns `None` for a thing without an id. Properties without an id
    /// are dropped.
    pub fn to_domain(self) -> Option<Thing> {
        let id = match ThingId::new(self.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "Skipping thing without id");
                return None;
            }
        };

        let properties = self
            .properties
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.to_domain(&id))
            .collect();

        Some(Thing {
            id,
            name: self.name,
            properties,
        })
    }
}

impl PropertyWire {
    fn to_domain(self, thing_id: &ThingId) -> Option<Property> {
        let id = match PropertyId::new(self.id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    thing_id = %thing_id,
                    property = %self.name,
                    error = %e,
                    "Skipping property without id"
                );
                return None;
            }
        };

        Some(Property {
            id,
            name: self.name,
            property_type: PropertyType::from(self.property_type),
            update_strategy: UpdateStrategy::from(self.update_strategy),
            last_value: self.last_value,
            value_updated_at: self.value_updated_at,
        })
    }
}

/// One query in a series batch request
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SeriesQuery {
    pub q: String,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregation: Option<String>,
}

impl SeriesQuery {
    pub fn new(q: String, from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self {
            q,
            from: from.to_rfc3339_opts(SecondsFormat::Secs, true),
            to: to.to_rfc3339_opts(SecondsFormat::Secs, true),
            interval: None,
            aggregation: None,
        }
    }

    pub fn with_interval(mut self, interval_seconds: i64) -> Self {
        self.interval = Some(interval_seconds);
        self
    }

    pub fn with_aggregation(mut self, statistic: &str) -> Self {
        self.aggregation = Some(statistic.to_string());
        self
    }
}

/// Body of the `batch_query*` endpoints
#[derive(Debug, Clone, Serialize)]
pub struct SeriesBatchRequest {
    pub requests: Vec<SeriesQuery>,
    pub resp_version: u32,
}

impl SeriesBatchRequest {
    pub fn new(requests: Vec<SeriesQuery>) -> Self {
        Self {
            requests,
            resp_version: 1,
        }
    }
}

/// Access token issued by the token endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// Error body returned by the API
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<String>,
}

/// Extracts the `detail` field from an error body, falling back to the raw
/// text
pub fn error_detail(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .unwrap_or_else(|| body.trim().to_string())
}
