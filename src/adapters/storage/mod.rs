//! Object storage abstraction
//!
//! This module defines the trait the export pipeline uploads finished files
//! through, and a filesystem-backed implementation.

pub mod filesystem;

pub use filesystem::FilesystemStore;

use crate::domain::Result;
use async_trait::async_trait;
use std::path::Path;

/// Object store client trait
///
/// Implementations store a local file under a `/`-separated key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store the file at `local_path` under `key`
    ///
    /// An existing object with the same key is replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the file can't be stored.
    async fn write_file(&self, key: &str, local_path: &Path) -> Result<()>;

    /// Human-readable destination name, used in logs
    fn destination(&self) -> String;
}
