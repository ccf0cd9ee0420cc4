//! Export runs and reporting
//!
//! - [`exporter`] drives one export from thing listing to upload
//! - [`compress`] gzips the output file
//! - [`summary`] reports what a run did

pub mod compress;
pub mod exporter;
pub mod summary;

pub use compress::gzip_file;
pub use exporter::{object_key, Exporter};
pub use summary::{ExportError, ExportErrorType, ExportSummary};
