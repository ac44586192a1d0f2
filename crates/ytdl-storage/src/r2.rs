//! Cloudflare R2 backend over the S3 API.

use std::path::Path;
use std::time::Duration as StdDuration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the R2 backend.
#[derive(Debug, Clone)]
pub struct R2Config {
    /// S3 API endpoint of the R2 bucket
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region, "auto" for R2
    pub region: String,
    /// Public custom-domain base; when set, URLs are built from it
    /// instead of presigning
    pub public_url: Option<String>,
}

impl R2Config {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_url: std::env::var("R2_PUBLIC_URL")
                .ok()
                .map(|u| u.trim_end_matches('/').to_string()),
        })
    }
}

/// R2 storage backend.
#[derive(Clone)]
pub struct R2Storage {
    client: Client,
    bucket: String,
    public_url: Option<String>,
}

impl R2Storage {
    pub fn new(config: R2Config) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            public_url: config.public_url,
        }
    }

    /// Upload a video file under the given key.
    pub async fn upload(&self, path: &Path, key: &str) -> StorageResult<()> {
        debug!(src = %path.display(), key, "uploading to R2");

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type("video/mp4")
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!(key, "uploaded artifact to R2");
        Ok(())
    }

    /// Produce a retrieval URL for the key.
    ///
    /// With a public custom domain configured the URL is a plain join and
    /// the bucket must be publicly readable; otherwise a presigned GET is
    /// generated. The returned expiry is `now + ttl` in both branches.
    pub async fn url_for(
        &self,
        key: &str,
        ttl_minutes: u32,
    ) -> StorageResult<(String, DateTime<Utc>)> {
        let expires_at = Utc::now() + Duration::minutes(i64::from(ttl_minutes));

        let url = match &self.public_url {
            Some(base) => format!("{base}/{key}"),
            None => {
                let presign_config = PresigningConfig::expires_in(StdDuration::from_secs(
                    u64::from(ttl_minutes) * 60,
                ))
                .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

                self.client
                    .get_object()
                    .bucket(&self.bucket)
                    .key(key)
                    .presigned(presign_config)
                    .await
                    .map_err(|e| StorageError::PresignFailed(e.to_string()))?
                    .uri()
                    .to_string()
            }
        };

        Ok((url, expires_at))
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        debug!(key, "deleting from R2");
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;
        Ok(())
    }
}
