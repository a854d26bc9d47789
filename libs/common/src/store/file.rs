//! Directory-backed store, one file per key
//!
//! Writes go to a temporary file in the same directory, are synced, and
//! then renamed over the target, so a crash mid-write leaves either the
//! old value or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::PersistentStore;
use crate::error::{StoreError, StoreResult};

/// Store that keeps each key in its own file under a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `root`, creating the directory if needed
    pub async fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await?;
        info!("File store opened at {}", root.display());
        Ok(Self { root })
    }

    /// Directory holding the key files
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> StoreResult<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key))
    }
}

impl PersistentStore for FileStore {
    async fn read(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        let path = self.path_for(key)?;
        let tmp = self.root.join(format!(".{}.{}.tmp", key, Uuid::new_v4()));

        let mut file = fs::File::create(&tmp).await?;
        let written = async {
            file.write_all(value).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            discard_temp(&tmp).await;
            return Err(e.into());
        }

        if let Err(e) = fs::rename(&tmp, &path).await {
            discard_temp(&tmp).await;
            return Err(e.into());
        }

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn discard_temp(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp).await {
        warn!("Failed to remove temporary file {}: {}", tmp.display(), e);
    }
}
