//! Filesystem claim record
//!
//! The marker is an empty file created with `create_new`, so two racing
//! creators cannot both succeed. The file and its directory are synced before
//! success is reported; a marker that cannot be made durable is removed again.

use async_trait::async_trait;
use lock_core::effects::ClaimRecordEffects;
use lock_core::{LockError, LockResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Name of the marker file inside the config directory
pub const CLAIM_FILE: &str = "claimed_lock";

/// Claim marker stored as a file in the daemon's config directory
#[derive(Debug, Clone)]
pub struct FilesystemClaimRecord {
    path: PathBuf,
    /// Directory synced after creating the marker
    sync_dir: PathBuf,
}

impl FilesystemClaimRecord {
    /// Marker at `<config_dir>/claimed_lock`
    pub fn new(config_dir: &Path) -> Self {
        Self {
            path: config_dir.join(CLAIM_FILE),
            sync_dir: config_dir.to_path_buf(),
        }
    }

    /// Location of the marker file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove a marker this process created but could not make durable
    async fn discard(&self) {
        match fs::remove_file(&self.path).await {
            Ok(()) => warn!(path = %self.path.display(), "removed claim record that failed to sync"),
            Err(e) => warn!(
                path = %self.path.display(),
                error = %e,
                "failed to remove claim record that failed to sync"
            ),
        }
    }

    async fn sync_parent(&self) -> LockResult<()> {
        #[cfg(unix)]
        {
            let dir = fs::File::open(&self.sync_dir).await?;
            dir.sync_all().await?;
        }
        Ok(())
    }
}

#[async_trait]
impl ClaimRecordEffects for FilesystemClaimRecord {
    async fn is_claimed(&self) -> LockResult<bool> {
        match fs::metadata(&self.path).await {
            Ok(meta) if meta.is_file() => Ok(true),
            Ok(_) => Err(LockError::config(format!(
                "{} exists but is not a file",
                self.path.display()
            ))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_if_absent(&self) -> LockResult<bool> {
        let file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await;
        match file {
            Ok(file) => {
                let synced = match file.sync_all().await {
                    Ok(()) => self.sync_parent().await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = synced {
                    self.discard().await;
                    return Err(e);
                }
                info!(path = %self.path.display(), "claim record created");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %self.path.display(), "claim record already present");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_once() {
        let dir = tempfile::tempdir().unwrap();
        let record = FilesystemClaimRecord::new(dir.path());
        assert!(!record.is_claimed().await.unwrap());
        assert!(record.create_if_absent().await.unwrap());
        assert!(record.is_claimed().await.unwrap());
        assert!(!record.create_if_absent().await.unwrap());
        assert!(dir.path().join(CLAIM_FILE).is_file());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_marker_is_removed_when_sync_fails() {
        let dir = tempfile::tempdir().unwrap();
        let record = FilesystemClaimRecord {
            path: dir.path().join(CLAIM_FILE),
            sync_dir: dir.path().join("missing"),
        };
        assert!(record.create_if_absent().await.is_err());
        assert!(!record.is_claimed().await.unwrap());
        assert!(!dir.path().join(CLAIM_FILE).exists());

        let record = FilesystemClaimRecord::new(dir.path());
        assert!(record.create_if_absent().await.unwrap());
    }

    #[tokio::test]
    async fn test_directory_in_place_of_marker_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join(CLAIM_FILE)).unwrap();
        let record = FilesystemClaimRecord::new(dir.path());
        assert!(matches!(
            record.is_claimed().await,
            Err(LockError::Config { .. })
        ));
    }
}
