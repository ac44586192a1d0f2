//! Error types for storage operations.

use thiserror::Error;
use ytdl_models::ErrorCode;

/// Errors from the storage gateway.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("presigning failed: {0}")]
    PresignFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn upload_failed(msg: impl Into<String>) -> Self {
        Self::UploadFailed(msg.into())
    }

    pub fn delete_failed(msg: impl Into<String>) -> Self {
        Self::DeleteFailed(msg.into())
    }

    /// Stable error code recorded on the job when this error is terminal.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            StorageError::ConfigError(_) => ErrorCode::InternalError,
            _ => ErrorCode::UploadFailed,
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
