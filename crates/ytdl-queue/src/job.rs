//! Work item carried on the Redis stream.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ytdl_models::JobId;

/// Payload of one queued download.
///
/// Carries only the job id; everything else is read back from the Job Store
/// at processing time, so a redelivered item never acts on stale data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    pub job_id: JobId,
    pub created_at: DateTime<Utc>,
}

impl DownloadJob {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            created_at: Utc::now(),
        }
    }
}
