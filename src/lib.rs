// IoT Exporter - IoT telemetry to object storage ETL Tool
// Copyright (c) 2025 IoT Exporter Contributors
// Licensed under the MIT License

//! # IoT Exporter - IoT telemetry to object storage ETL
//!
//! Exports the time-series telemetry of IoT cloud things to CSV files and
//! stores them in a bucket, one file per extraction window.
//!
//! ## Overview
//!
//! A run:
//! - **Lists** things with their properties, optionally filtered by tags
//! - **Aligns** a time window to the configured resolution
//! - **Extracts** aggregated, sampled or raw series, one bounded task per thing
//! - **Writes** rows to a shared CSV file, falling back to last known values
//! - **Stores** the file (optionally gzipped) under a date-partitioned key
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Extraction engine and export pipeline
//! - [`adapters`] - IoT cloud API client and object storage
//! - [`domain`] - Things, properties, ids and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use iot_exporter::config::load_config;
//! use iot_exporter::core::export::Exporter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("iot-exporter.toml")?;
//!     let exporter = Exporter::from_config(&config)?;
//!
//!     let summary = exporter.run().await?;
//!     println!("Exported {} rows to {:?}", summary.rows_exported, summary.object_key);
//!     Ok(())
//! }
//! ```
//!
//! ## Output
//!
//! ```text
//! timestamp,thing_id,thing_name,property_id,property_name,property_type,value,aggregation_statistic
//! 2024-05-10T09:10:00Z,91f3...,boiler,c86f...,temperature,FLOAT,21.5,AVG
//! ```
//!
//! Raw extractions omit the last column.
//!
//! ## Error Handling
//!
//! All library operations return [`domain::Result`]. A thing whose series
//! cannot be fetched does not stop the run; its failure is recorded in the
//! export summary and the rows of the other things are still stored.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
