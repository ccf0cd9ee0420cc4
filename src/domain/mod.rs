//! Domain models and types for the IoT exporter.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ThingId`], [`PropertyId`])
//! - **Thing snapshots** ([`Thing`], [`Property`], [`UpdateStrategy`])
//! - **Property type vocabulary** ([`PropertyType`])
//! - **Error types** ([`ExporterError`], [`IotApiError`], [`ThingFailure`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so thing and property ids can't be mixed:
//!
//! ```rust
//! use iot_exporter::domain::{PropertyId, ThingId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let thing_id = ThingId::new("91f30213-2bd7-480a-b1dc-f31b01840e7e")?;
//! let property_id = PropertyId::new("c86f4ed9-7f52-4bd3-bdc6-b2936bec68ac")?;
//!
//! // This won't compile
//! // let wrong: ThingId = property_id;
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod ids;
pub mod property_type;
pub mod result;
pub mod thing;

// Re-export commonly used types for convenience
pub use errors::{ExporterError, IotApiError, ThingFailure};
pub use ids::{PropertyId, ThingId};
pub use property_type::PropertyType;
pub use result::Result;
pub use thing::{Property, Thing, UpdateStrategy};
