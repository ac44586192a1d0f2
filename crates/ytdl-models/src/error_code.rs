//! Stable error codes exposed by the API and recorded on failed jobs.

use serde::{Deserialize, Serialize};

/// Error codes returned to clients and stored on terminal job records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// URL failed host/scheme validation
    InvalidUrl,
    /// Source video is private or unavailable
    UpstreamFailure,
    /// Generic fetch failure (either strategy)
    DownloadFailed,
    /// Remux tool exited non-zero
    MergeFailed,
    /// Storage backend rejected the upload
    UploadFailed,
    /// Missing or incorrect API token
    Unauthorized,
    /// Caller exceeded the per-minute job creation quota
    RateLimited,
    /// Unknown or expired job identifier
    JobNotFound,
    /// Catch-all for unclassified failures
    InternalError,
}

impl ErrorCode {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => "INVALID_URL",
            ErrorCode::UpstreamFailure => "UPSTREAM_FAILURE",
            ErrorCode::DownloadFailed => "DOWNLOAD_FAILED",
            ErrorCode::MergeFailed => "MERGE_FAILED",
            ErrorCode::UploadFailed => "UPLOAD_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::RateLimited => "RATE_LIMITED",
            ErrorCode::JobNotFound => "JOB_NOT_FOUND",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message used when no more specific one is available.
    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::InvalidUrl => {
                "Invalid or unsupported URL. Only YouTube URLs are supported."
            }
            ErrorCode::UpstreamFailure => {
                "YouTube is temporarily unavailable. Please try again later."
            }
            ErrorCode::DownloadFailed => "Failed to download the video. Please try again.",
            ErrorCode::MergeFailed => "Failed to merge video and audio streams.",
            ErrorCode::UploadFailed => "Failed to upload the processed video.",
            ErrorCode::Unauthorized => "Invalid or missing API token.",
            ErrorCode::RateLimited => "Too many requests. Please slow down.",
            ErrorCode::JobNotFound => "Job not found.",
            ErrorCode::InternalError => "An internal error occurred.",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_format_is_screaming_snake_case() {
        let json = serde_json::to_string(&ErrorCode::DownloadFailed).unwrap();
        assert_eq!(json, "\"DOWNLOAD_FAILED\"");

        let code: ErrorCode = serde_json::from_str("\"RATE_LIMITED\"").unwrap();
        assert_eq!(code, ErrorCode::RateLimited);
    }

    #[test]
    fn display_matches_wire_string() {
        assert_eq!(ErrorCode::JobNotFound.to_string(), "JOB_NOT_FOUND");
    }
}
