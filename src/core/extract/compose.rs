//! Output row composition
//!
//! Every sample, whatever API shape it came from, becomes a [`SampleRow`].
//! The run's [`RowShape`] then decides whether the trailing aggregation column
//! is written.

use crate::domain::ids::{PropertyId, ThingId};
use crate::domain::Thing;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Tag written for rows synthesized from a property's cached last value
pub const LAST_VALUE_TAG: &str = "LAST_VALUE";

const AGGREGATED_HEADER: [&str; 8] = [
    "timestamp",
    "thing_id",
    "thing_name",
    "property_id",
    "property_name",
    "property_type",
    "value",
    "aggregation_statistic",
];

/// Column layout of an output file, fixed for a whole run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowShape {
    /// Eight columns, trailing aggregation tag
    Aggregated,
    /// Seven columns
    Raw,
}

impl RowShape {
    pub fn for_raw(is_raw: bool) -> Self {
        if is_raw {
            RowShape::Raw
        } else {
            RowShape::Aggregated
        }
    }

    pub fn width(&self) -> usize {
        match self {
            RowShape::Aggregated => 8,
            RowShape::Raw => 7,
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        &AGGREGATED_HEADER[..self.width()]
    }
}

/// Origin of a row's value, written in the aggregation column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationTag {
    /// Aggregated by the named statistic
    Statistic(String),
    /// Cached last value
    LastValue,
    /// Sampled string or raw value
    None,
}

impl AggregationTag {
    pub fn as_str(&self) -> &str {
        match self {
            AggregationTag::Statistic(stat) => stat,
            AggregationTag::LastValue => LAST_VALUE_TAG,
            AggregationTag::None => "",
        }
    }
}

/// One output record
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    pub timestamp: DateTime<Utc>,
    pub thing_id: ThingId,
    pub thing_name: String,
    pub property_id: PropertyId,
    pub property_name: String,
    pub property_type: String,
    pub value: String,
    pub aggregation: AggregationTag,
}

impl SampleRow {
    /// Builds a row for one of `thing`'s properties.
    ///
    /// Name and type come from the thing snapshot. A property id the snapshot
    /// doesn't know gets empty name and type.
    pub fn for_property(
        thing: &Thing,
        property_id: &PropertyId,
        timestamp: DateTime<Utc>,
        value: String,
        aggregation: AggregationTag,
    ) -> Self {
        let (property_name, property_type) = thing
            .property(property_id)
            .map(|p| (p.name.clone(), p.property_type.normalized().to_string()))
            .unwrap_or_default();

        Self {
            timestamp,
            thing_id: thing.id.clone(),
            thing_name: thing.name.clone(),
            property_id: property_id.clone(),
            property_name,
            property_type,
            value,
            aggregation,
        }
    }

    /// Fields in output order, truncated to `shape`
    pub fn to_record(&self, shape: RowShape) -> Vec<String> {
        let mut record = vec![
            self.timestamp_field(),
            self.thing_id.to_string(),
            self.thing_name.clone(),
            self.property_id.to_string(),
            self.property_name.clone(),
            self.property_type.clone(),
            self.value.clone(),
        ];
        if shape == RowShape::Aggregated {
            record.push(self.aggregation.as_str().to_string());
        }
        record
    }

    /// RFC 3339 timestamp, second precision, `Z` suffix
    pub fn timestamp_field(&self) -> String {
        format_timestamp(self.timestamp)
    }
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Renders an upstream value as an output field.
///
/// Returns `None` for null, which callers skip.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (None, Some(u), _) => u.to_string(),
            (None, None, Some(f)) => render_float(f),
            _ => n.to_string(),
        }),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

/// Minimal decimal form: no exponent, no trailing zeros
pub fn render_float(value: f64) -> String {
    format!("{value}")
}
