//! Thing and property snapshots
//!
//! A [`Thing`] is fetched once per run together with its properties and is
//! never mutated afterwards.

use super::ids::{PropertyId, ThingId};
use super::property_type::PropertyType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a property pushes new values to the cloud
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateStrategy {
    /// Value is sent only when it changes
    OnChange,
    /// Value is sent periodically
    Timed,
    /// Any other strategy reported upstream
    Other(String),
}

impl UpdateStrategy {
    pub fn as_str(&self) -> &str {
        match self {
            UpdateStrategy::OnChange => "ON_CHANGE",
            UpdateStrategy::Timed => "TIMED",
            UpdateStrategy::Other(s) => s,
        }
    }
}

impl From<String> for UpdateStrategy {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ON_CHANGE" => UpdateStrategy::OnChange,
            "TIMED" => UpdateStrategy::Timed,
            _ => UpdateStrategy::Other(s),
        }
    }
}

impl From<UpdateStrategy> for String {
    fn from(strategy: UpdateStrategy) -> Self {
        strategy.as_str().to_string()
    }
}

/// Property snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub property_type: PropertyType,
    pub update_strategy: UpdateStrategy,

    /// Last value the cloud knows about, in its JSON form
    #[serde(default)]
    pub last_value: Option<serde_json::Value>,

    /// When `last_value` was last updated
    #[serde(default)]
    pub value_updated_at: Option<DateTime<Utc>>,
}

/// Thing snapshot with its ordered property list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thing {
    pub id: ThingId,
    pub name: String,
    #[serde(default)]
    pub properties: Vec<Property>,
}

impl Thing {
    /// Looks up a property by id
    pub fn property(&self, id: &PropertyId) -> Option<&Property> {
        self.properties.iter().find(|p| &p.id == id)
    }

    pub fn has_properties(&self) -> bool {
        !self.properties.is_empty()
    }
}
