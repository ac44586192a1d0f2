//! Filesystem-backed storage for development and single-host deployments.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Stores artifacts under a local directory served by something else
/// (e.g. a reverse proxy at `base_url`). The expiry on returned URLs is
/// advisory only; files are not access-controlled by time.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Copy the file under the given key, creating parent directories.
    pub async fn upload(&self, path: &Path, key: &str) -> StorageResult<()> {
        let dest = self.root.join(key);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::upload_failed(e.to_string()))?;
        }

        debug!(src = %path.display(), dest = %dest.display(), "copying artifact");
        tokio::fs::copy(path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(key, "stored artifact locally");
        Ok(())
    }

    /// Join the base URL with the key. The expiry is advisory.
    pub fn url_for(&self, key: &str, ttl_minutes: u32) -> (String, DateTime<Utc>) {
        let url = format!("{}/{}", self.base_url, key);
        let expires_at = Utc::now() + Duration::minutes(i64::from(ttl_minutes));
        (url, expires_at)
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.root.join(key);
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;
        Ok(())
    }
}
