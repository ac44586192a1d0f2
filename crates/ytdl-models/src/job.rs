//! Job records and the job state machine.
//!
//! A `JobRecord` is the durable snapshot of one download job, stored in the
//! Job Store under `job:{job_id}`. The submission service creates it in the
//! `Queued` state; after that only the worker processing the job mutates it,
//! by applying `JobUpdate`s. State transitions are monotonic: once a record
//! is terminal (`Done` or `Error`) no further update changes it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error_code::ErrorCode;
use crate::quality::Quality;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for a worker
    #[default]
    Queued,
    /// Job is actively being processed
    Running,
    /// Job completed successfully
    Done,
    /// Job failed with an error
    Error,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage of the download pipeline a running job is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Downloading,
    Processing,
    Uploading,
}

impl ProgressStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressStage::Downloading => "downloading",
            ProgressStage::Processing => "processing",
            ProgressStage::Uploading => "uploading",
        }
    }
}

impl fmt::Display for ProgressStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progress snapshot for a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    /// Current pipeline stage
    pub stage: ProgressStage,
    /// Percentage within the stage (0-100)
    pub pct: u8,
}

impl JobProgress {
    /// Create a progress snapshot, clamping the percentage to 0-100.
    pub fn new(stage: ProgressStage, pct: u8) -> Self {
        Self {
            stage,
            pct: pct.min(100),
        }
    }
}

/// Durable record of one download job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job ID
    pub job_id: JobId,
    /// Source video URL
    pub url: String,
    /// Requested quality
    pub quality: Quality,
    /// Current status
    pub status: JobStatus,
    /// When the job was created
    pub created_at: DateTime<Utc>,
    /// Progress snapshot, meaningful only while running
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
    /// Time-limited download URL (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    /// When the download URL expires (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Final filename (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Storage object key (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    /// When the job reached its terminal state (set on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Stable error code (set on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    /// Human-readable error message (set on failure)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobRecord {
    /// Create a new queued record.
    pub fn new(url: impl Into<String>, quality: Quality) -> Self {
        Self {
            job_id: JobId::new(),
            url: url.into(),
            quality,
            status: JobStatus::Queued,
            created_at: Utc::now(),
            progress: None,
            download_url: None,
            expires_at: None,
            filename: None,
            object_key: None,
            completed_at: None,
            error_code: None,
            message: None,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Merge an update into this record.
    ///
    /// Only populated fields are applied. Once the record is terminal the
    /// update is ignored entirely, which makes redelivered work items and
    /// stray progress writes harmless.
    pub fn merge(&mut self, update: JobUpdate) {
        if self.is_terminal() {
            return;
        }

        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(progress) = update.progress {
            self.progress = Some(progress);
        }
        if let Some(download_url) = update.download_url {
            self.download_url = Some(download_url);
        }
        if let Some(expires_at) = update.expires_at {
            self.expires_at = Some(expires_at);
        }
        if let Some(filename) = update.filename {
            self.filename = Some(filename);
        }
        if let Some(object_key) = update.object_key {
            self.object_key = Some(object_key);
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        }
        if let Some(error_code) = update.error_code {
            self.error_code = Some(error_code);
        }
        if let Some(message) = update.message {
            self.message = Some(message);
        }

        // Progress is only meaningful while running.
        if self.is_terminal() {
            self.progress = None;
        }
    }
}

/// Partial update merged into a `JobRecord` by the Job Store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<JobProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl JobUpdate {
    /// Transition to running with an initial progress snapshot.
    pub fn running(stage: ProgressStage) -> Self {
        Self {
            status: Some(JobStatus::Running),
            progress: Some(JobProgress::new(stage, 0)),
            ..Default::default()
        }
    }

    /// Progress-only update.
    pub fn progress(stage: ProgressStage, pct: u8) -> Self {
        Self {
            progress: Some(JobProgress::new(stage, pct)),
            ..Default::default()
        }
    }

    /// Successful completion.
    pub fn done(
        download_url: impl Into<String>,
        expires_at: DateTime<Utc>,
        filename: impl Into<String>,
        object_key: impl Into<String>,
    ) -> Self {
        Self {
            status: Some(JobStatus::Done),
            download_url: Some(download_url.into()),
            expires_at: Some(expires_at),
            filename: Some(filename.into()),
            object_key: Some(object_key.into()),
            completed_at: Some(Utc::now()),
            ..Default::default()
        }
    }

    /// Terminal failure with an error code and message.
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error_code: Some(code),
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_is_queued() {
        let record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q720);
        assert_eq!(record.status, JobStatus::Queued);
        assert!(record.progress.is_none());
        assert!(!record.is_terminal());
    }

    #[test]
    fn running_then_done_transitions() {
        let mut record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q720);

        record.merge(JobUpdate::running(ProgressStage::Downloading));
        assert_eq!(record.status, JobStatus::Running);
        assert_eq!(
            record.progress,
            Some(JobProgress::new(ProgressStage::Downloading, 0))
        );

        record.merge(JobUpdate::progress(ProgressStage::Downloading, 55));
        assert_eq!(record.progress.unwrap().pct, 55);

        record.merge(JobUpdate::done(
            "https://cdn.example.com/videos/x/a.mp4",
            Utc::now(),
            "a.mp4",
            "videos/x/a.mp4",
        ));
        assert_eq!(record.status, JobStatus::Done);
        assert!(record.is_terminal());
        assert!(record.completed_at.is_some());
        // Progress is cleared once terminal.
        assert!(record.progress.is_none());
    }

    #[test]
    fn terminal_records_ignore_further_updates() {
        let mut record = JobRecord::new("https://youtu.be/abc12345678", Quality::Best);
        record.merge(JobUpdate::error(ErrorCode::DownloadFailed, "boom"));
        assert_eq!(record.status, JobStatus::Error);

        // A late running transition or progress write must not regress state.
        record.merge(JobUpdate::running(ProgressStage::Downloading));
        assert_eq!(record.status, JobStatus::Error);
        assert!(record.progress.is_none());

        record.merge(JobUpdate::done("url", Utc::now(), "f.mp4", "k"));
        assert_eq!(record.status, JobStatus::Error);
        assert!(record.download_url.is_none());
        assert_eq!(record.error_code, Some(ErrorCode::DownloadFailed));
    }

    #[test]
    fn progress_percentage_clamps() {
        let progress = JobProgress::new(ProgressStage::Uploading, 250);
        assert_eq!(progress.pct, 100);
    }

    #[test]
    fn record_serde_round_trip() {
        let mut record = JobRecord::new("https://youtu.be/abc12345678", Quality::Q1080);
        record.merge(JobUpdate::running(ProgressStage::Downloading));

        let json = serde_json::to_string(&record).unwrap();
        let decoded: JobRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.job_id, record.job_id);
        assert_eq!(decoded.status, JobStatus::Running);
        assert_eq!(decoded.quality, Quality::Q1080);
        // Success/failure fields stay absent from the wire until set.
        assert!(!json.contains("download_url"));
        assert!(!json.contains("error_code"));
    }
}
