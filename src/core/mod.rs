//! Core business logic for the IoT exporter.
//!
//! # Modules
//!
//! - [`extract`] - Window alignment, series fetching and concurrent row composition
//! - [`export`] - End-to-end export runs and their summaries
//!
//! # Export Workflow
//!
//! 1. **List things**: Query the thing directory, filtered by tags
//! 2. **Extract**: One bounded task per thing writes rows to a CSV file
//! 3. **Close**: Flush the file once every task has joined
//! 4. **Compress** (optional): Gzip the file
//! 5. **Upload**: Store it under a date-partitioned key
//! 6. **Report**: Build an export summary
//!
//! # Example
//!
//! ```rust,no_run
//! use iot_exporter::config::load_config;
//! use iot_exporter::core::export::Exporter;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("iot-exporter.toml")?;
//! let exporter = Exporter::from_config(&config)?;
//! let summary = exporter.run().await?;
//!
//! println!("Rows: {}", summary.rows_exported);
//! println!("Failed things: {}", summary.things_failed);
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod extract;
