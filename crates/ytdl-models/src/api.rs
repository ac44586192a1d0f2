//! Request and response payloads for the HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error_code::ErrorCode;
use crate::job::{JobId, JobProgress, JobRecord, JobStatus};
use crate::quality::Quality;

/// Body of `POST /api/jobs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobRequest {
    /// Source video URL
    pub url: String,
    /// Requested quality, defaults to 720p
    #[serde(default)]
    pub quality: Quality,
}

/// Response to a successful job submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: JobId,
    pub status: JobStatus,
}

impl From<&JobRecord> for CreateJobResponse {
    fn from(record: &JobRecord) -> Self {
        Self {
            job_id: record.job_id.clone(),
            status: record.status,
        }
    }
}

/// Response of `GET /api/jobs/{id}`.
///
/// Success and failure fields are absent unless the job has reached the
/// corresponding terminal state; progress is only present while running.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: JobId,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<JobRecord> for JobStatusResponse {
    fn from(record: JobRecord) -> Self {
        let progress = match record.status {
            JobStatus::Running => record.progress,
            _ => None,
        };
        Self {
            job_id: record.job_id,
            status: record.status,
            created_at: record.created_at,
            progress,
            download_url: record.download_url,
            expires_at: record.expires_at,
            filename: record.filename,
            error_code: record.error_code,
            message: record.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobUpdate, ProgressStage};

    #[test]
    fn quality_defaults_to_720() {
        let request: CreateJobRequest =
            serde_json::from_str(r#"{"url": "https://youtu.be/abc12345678"}"#).unwrap();
        assert_eq!(request.quality, Quality::Q720);
    }

    #[test]
    fn queued_status_response_has_no_optional_fields() {
        let record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q720);
        let response = JobStatusResponse::from(record);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"queued\""));
        assert!(!json.contains("progress"));
        assert!(!json.contains("download_url"));
        assert!(!json.contains("error_code"));
    }

    #[test]
    fn running_status_response_carries_progress() {
        let mut record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q720);
        record.merge(JobUpdate::running(ProgressStage::Downloading));
        record.merge(JobUpdate::progress(ProgressStage::Downloading, 42));

        let response = JobStatusResponse::from(record);
        let progress = response.progress.unwrap();
        assert_eq!(progress.stage, ProgressStage::Downloading);
        assert_eq!(progress.pct, 42);
    }

    #[test]
    fn error_status_response_carries_code_and_message() {
        let mut record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q720);
        record.merge(JobUpdate::error(
            ErrorCode::UpstreamFailure,
            "video is private",
        ));

        let response = JobStatusResponse::from(record);
        assert_eq!(response.error_code, Some(ErrorCode::UpstreamFailure));
        assert_eq!(response.message.as_deref(), Some("video is private"));
        assert!(response.progress.is_none());
        assert!(response.download_url.is_none());
    }
}
