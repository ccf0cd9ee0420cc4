//! Filesystem object store
//!
//! Treats a local directory as the bucket; keys map to relative paths.

use super::ObjectStore;
use crate::domain::{ExporterError, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};

/// Object store rooted at a local directory
#[derive(Debug, Clone)]
pub struct FilesystemStore {
    root: PathBuf,
}

impl FilesystemStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an object key resolves to.
    ///
    /// Keys must be relative and may not climb out of the root.
    pub fn object_path(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let valid = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !valid {
            return Err(ExporterError::Storage(format!("Invalid object key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn write_file(&self, key: &str, local_path: &Path) -> Result<()> {
        let target = self.object_path(key)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ExporterError::Storage(format!("Failed to create {}: {e}", parent.display()))
            })?;
        }

        let bytes = tokio::fs::copy(local_path, &target).await.map_err(|e| {
            ExporterError::Storage(format!(
                "Failed to copy {} to {}: {e}",
                local_path.display(),
                target.display()
            ))
        })?;

        tracing::info!(
            key = %key,
            destination = %self.destination(),
            bytes,
            "Stored object"
        );
        Ok(())
    }

    fn destination(&self) -> String {
        self.root.display().to_string()
    }
}
