//! Domain identifier types with validation
//!
//! Newtype wrappers for IoT cloud identifiers. Each type keeps thing and
//! property ids from being mixed up and rejects blank values.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Thing identifier newtype wrapper
///
/// # Examples
///
/// ```
/// use iot_exporter::domain::ids::ThingId;
/// use std::str::FromStr;
///
/// let thing_id = ThingId::from_str("91f30213-2bd7-480a-b1dc-f31b01840e7e").unwrap();
/// assert_eq!(thing_id.as_str(), "91f30213-2bd7-480a-b1dc-f31b01840e7e");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ThingId(String);

impl ThingId {
    /// Creates a new ThingId from a string
    ///
    /// Returns `Err` if the id is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Thing ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the thing ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The series query scoping every property of this thing
    pub fn series_query(&self) -> String {
        format!("{THING_QUERY_PREFIX}{}", self.0)
    }
}

impl fmt::Display for ThingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThingId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ThingId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Property identifier newtype wrapper
///
/// # Examples
///
/// ```
/// use iot_exporter::domain::ids::PropertyId;
///
/// let id = PropertyId::from_series_query("property.c86f4ed9").unwrap();
/// assert_eq!(id.as_str(), "c86f4ed9");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(String);

/// Prefix echoed by the series API for property-scoped queries
pub const PROPERTY_QUERY_PREFIX: &str = "property.";

/// Prefix of thing-scoped series queries
pub const THING_QUERY_PREFIX: &str = "thing.";

impl PropertyId {
    /// Creates a new PropertyId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Property ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Recovers the bare id from a `property.<id>` query echo.
    ///
    /// Returns `None` for any other echo shape.
    pub fn from_series_query(query: &str) -> Option<Self> {
        query
            .strip_prefix(PROPERTY_QUERY_PREFIX)
            .and_then(|id| Self::new(id).ok())
    }

    /// The series query addressing this single property
    pub fn series_query(&self) -> String {
        format!("{PROPERTY_QUERY_PREFIX}{}", self.0)
    }

    /// Returns the property ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PropertyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for PropertyId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
