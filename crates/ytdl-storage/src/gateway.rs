//! Backend selection behind a single gateway type.

use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{StorageError, StorageResult};
use crate::local::LocalStorage;
use crate::r2::{R2Config, R2Storage};

const DEFAULT_URL_EXPIRY_MINUTES: u32 = 30;

/// Which backend to use, from `STORAGE_MODE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    R2,
}

/// Environment-driven storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Root directory for the local backend
    pub local_dir: String,
    /// Public base URL for files served from the local backend
    pub base_url: String,
    /// Lifetime of returned download URLs
    pub url_expiry_minutes: u32,
}

impl StorageConfig {
    pub fn from_env() -> StorageResult<Self> {
        let mode = match std::env::var("STORAGE_MODE")
            .unwrap_or_else(|_| "local".to_string())
            .to_lowercase()
            .as_str()
        {
            "local" => StorageMode::Local,
            "r2" => StorageMode::R2,
            other => {
                return Err(StorageError::config_error(format!(
                    "unknown STORAGE_MODE: {other}"
                )))
            }
        };

        Ok(Self {
            mode,
            local_dir: std::env::var("LOCAL_STORAGE_DIR")
                .unwrap_or_else(|_| "./storage".to_string()),
            base_url: std::env::var("BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8000/files".to_string()),
            url_expiry_minutes: std::env::var("URL_EXPIRY_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_URL_EXPIRY_MINUTES),
        })
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Local,
            local_dir: "./storage".to_string(),
            base_url: "http://localhost:8000/files".to_string(),
            url_expiry_minutes: DEFAULT_URL_EXPIRY_MINUTES,
        }
    }
}

/// Storage gateway dispatching to the configured backend.
#[derive(Clone)]
pub enum Storage {
    Local(LocalStorage),
    R2(R2Storage),
}

impl Storage {
    /// Build the backend named by the configuration. The R2 branch reads
    /// its credentials from the environment.
    pub fn from_config(config: &StorageConfig) -> StorageResult<Self> {
        match config.mode {
            StorageMode::Local => Ok(Storage::Local(LocalStorage::new(
                &config.local_dir,
                &config.base_url,
            ))),
            StorageMode::R2 => Ok(Storage::R2(R2Storage::new(R2Config::from_env()?))),
        }
    }

    /// Ship the file under the given key.
    pub async fn upload(&self, path: &Path, key: &str) -> StorageResult<()> {
        match self {
            Storage::Local(local) => local.upload(path, key).await,
            Storage::R2(r2) => r2.upload(path, key).await,
        }
    }

    /// Retrieval URL plus its expiry timestamp (`now + ttl` on every branch).
    pub async fn url_for(
        &self,
        key: &str,
        ttl_minutes: u32,
    ) -> StorageResult<(String, DateTime<Utc>)> {
        match self {
            Storage::Local(local) => Ok(local.url_for(key, ttl_minutes)),
            Storage::R2(r2) => r2.url_for(key, ttl_minutes).await,
        }
    }

    /// Best-effort delete. Failures are logged, never raised; cleanup is
    /// not on the critical success path.
    pub async fn delete(&self, key: &str) {
        let result = match self {
            Storage::Local(local) => local.delete(key).await,
            Storage::R2(r2) => r2.delete(key).await,
        };
        if let Err(e) = result {
            warn!(key, error = %e, "failed to delete stored object");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn config_defaults_are_local() {
        let config = StorageConfig::default();
        assert_eq!(config.mode, StorageMode::Local);
        assert_eq!(config.url_expiry_minutes, 30);
    }

    #[tokio::test]
    async fn gateway_round_trip_on_local_backend() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("clip.mp4");
        tokio::fs::write(&src, b"bytes").await.unwrap();

        let config = StorageConfig {
            mode: StorageMode::Local,
            local_dir: dir.path().join("store").to_string_lossy().into_owned(),
            base_url: "http://localhost:8000/files".to_string(),
            url_expiry_minutes: 15,
        };
        let storage = Storage::from_config(&config).unwrap();

        storage.upload(&src, "videos/j/clip.mp4").await.unwrap();
        let before = Utc::now();
        let (url, expires_at) = storage
            .url_for("videos/j/clip.mp4", config.url_expiry_minutes)
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:8000/files/videos/j/clip.mp4");
        assert!(expires_at >= before + Duration::minutes(15));
        assert!(expires_at <= Utc::now() + Duration::minutes(15));
    }

    #[tokio::test]
    async fn delete_never_panics_on_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::Local(LocalStorage::new(dir.path(), "http://localhost:8000"));
        storage.delete("videos/missing/clip.mp4").await;
    }
}
