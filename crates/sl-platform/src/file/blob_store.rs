//! Blob storage for uploaded file contents

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::shared::error::{PlatformError, Result};

/// Byte storage addressed by a flat name.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, contents: Bytes) -> Result<()>;

    /// `None` if no blob is stored under `name`.
    async fn get(&self, name: &str) -> Result<Option<Bytes>>;

    async fn exists(&self, name: &str) -> Result<bool>;

    async fn delete(&self, name: &str) -> Result<()>;
}

/// Blobs as files in one local directory
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    /// Use `root`, creating it if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| PlatformError::Storage {
            message: format!("Could not create upload directory {}: {}", root.display(), e),
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let plain = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\'])
            && !name.contains("..");
        if !plain {
            return Err(PlatformError::Storage {
                message: format!("Invalid blob name: {}", name),
            });
        }
        Ok(self.root.join(name))
    }
}

fn storage_error(action: &str, name: &str, e: std::io::Error) -> PlatformError {
    PlatformError::Storage {
        message: format!("Could not {} {}: {}", action, name, e),
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, name: &str, contents: Bytes) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, &contents)
            .await
            .map_err(|e| storage_error("store", name, e))?;
        debug!(name = %name, bytes = contents.len(), "Blob stored");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Bytes>> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", name, e)),
        }
    }

    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.path_for(name)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| storage_error("stat", name, e))
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("delete", name, e)),
        }
    }
}
