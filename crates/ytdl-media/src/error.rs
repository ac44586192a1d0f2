//! Error types for media acquisition.

use thiserror::Error;
use ytdl_models::ErrorCode;

/// Errors from the media fetcher and its strategies.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("source unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("fetch failed: {0}")]
    FetchFailed(String),

    #[error("remux failed: {0}")]
    MergeFailed(String),

    #[error("yt-dlp executable not found in PATH")]
    YtDlpNotFound,

    #[error("ffmpeg executable not found in PATH")]
    FfmpegNotFound,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl FetchError {
    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }

    pub fn upstream_unavailable(msg: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(msg.into())
    }

    pub fn fetch_failed(msg: impl Into<String>) -> Self {
        Self::FetchFailed(msg.into())
    }

    pub fn merge_failed(msg: impl Into<String>) -> Self {
        Self::MergeFailed(msg.into())
    }

    /// Stable error code recorded on the job when this error is terminal.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            FetchError::InvalidSource(_) => ErrorCode::InvalidUrl,
            FetchError::UpstreamUnavailable(_) => ErrorCode::UpstreamFailure,
            FetchError::MergeFailed(_) => ErrorCode::MergeFailed,
            FetchError::FetchFailed(_)
            | FetchError::YtDlpNotFound
            | FetchError::FfmpegNotFound
            | FetchError::Io(_)
            | FetchError::Http(_) => ErrorCode::DownloadFailed,
        }
    }
}

/// Result type for media operations.
pub type FetchResult<T> = Result<T, FetchError>;
