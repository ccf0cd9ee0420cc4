//! IoT cloud adapter
//!
//! The [`TelemetryApi`] trait the extraction engine depends on, and its HTTP
//! implementation [`ArduinoIotClient`].

pub mod api;
pub mod client;
pub mod models;
pub mod token;

pub use api::{AggregatedBatch, SampledBatch, SeriesBatch, SeriesResponse, TelemetryApi};
pub use client::ArduinoIotClient;
pub use token::TokenSource;
