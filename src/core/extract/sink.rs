//! Concurrent CSV sink
//!
//! One sink backs one output file. Extraction tasks share it through an
//! `Arc` and append whole batches under a single lock, so records from
//! different things never interleave.

use super::compose::{RowShape, SampleRow};
use crate::domain::{ExporterError, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

type CsvWriter = csv::Writer<File>;

/// Output file name for a window starting at `window_start`
pub fn file_name(window_start: DateTime<Utc>) -> String {
    format!("{}.csv", window_start.format("%Y-%m-%d-%H-%M"))
}

/// Append-only CSV file shared by extraction tasks
#[derive(Debug)]
pub struct CsvSink {
    path: PathBuf,
    shape: RowShape,
    writer: Mutex<Option<CsvWriter>>,
}

impl CsvSink {
    /// Creates `{dir}/{window_start}.csv` and writes the header row.
    ///
    /// An existing file with the same name is truncated.
    pub fn create(dir: impl AsRef<Path>, window_start: DateTime<Utc>, shape: RowShape) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(file_name(window_start));

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)?;
        writer.write_record(shape.header())?;
        writer.flush()?;

        tracing::debug!(path = %path.display(), ?shape, "Created output file");

        Ok(Self {
            path,
            shape,
            writer: Mutex::new(Some(writer)),
        })
    }

    /// Appends a batch of rows and flushes.
    ///
    /// Returns the number of rows written.
    pub fn write(&self, rows: &[SampleRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut guard = self.lock()?;
        let writer = guard
            .as_mut()
            .ok_or_else(|| ExporterError::Sink(format!("{} is closed", self.path.display())))?;

        for row in rows {
            writer.write_record(row.to_record(self.shape))?;
        }
        writer.flush()?;
        Ok(rows.len())
    }

    /// Flushes and closes the file.
    ///
    /// Closing an already closed sink is an error.
    pub fn close(&self) -> Result<()> {
        let writer = self
            .lock()?
            .take()
            .ok_or_else(|| ExporterError::Sink("no file to close".to_string()))?;

        writer
            .into_inner()
            .map_err(|e| ExporterError::Sink(e.to_string()))?
            .sync_all()?;

        tracing::debug!(path = %self.path.display(), "Closed output file");
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.lock().map(|guard| guard.is_some()).unwrap_or(false)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn shape(&self) -> RowShape {
        self.shape
    }

    /// Closes the file if still open, then removes it
    pub fn discard(&self) -> Result<()> {
        drop(self.lock()?.take());

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Removed output file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<CsvWriter>>> {
        self.writer
            .lock()
            .map_err(|_| ExporterError::Sink("output file lock poisoned".to_string()))
    }
}
