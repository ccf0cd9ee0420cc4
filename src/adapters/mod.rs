//! External system integrations for the IoT exporter.
//!
//! - [`iot`] - IoT cloud thing directory and time-series API
//! - [`storage`] - Object storage the output files are written to
//!
//! Both are consumed through traits ([`iot::TelemetryApi`],
//! [`storage::ObjectStore`]) so the export pipeline can be tested with
//! in-memory implementations.

pub mod iot;
pub mod storage;
