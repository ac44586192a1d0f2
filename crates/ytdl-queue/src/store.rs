//! Durable job records in Redis with TTL-based expiry.

use redis::AsyncCommands;
use tracing::debug;
use ytdl_models::{JobId, JobRecord, JobUpdate};

use crate::error::{QueueError, QueueResult};

/// Records expire one day after their last write. Expiry is the only
/// removal mechanism; there is no delete path.
const JOB_TTL_SECS: u64 = 86400;

fn job_key(id: &JobId) -> String {
    format!("job:{id}")
}

/// Job Store over Redis string keys.
#[derive(Clone)]
pub struct JobStore {
    client: redis::Client,
}

impl JobStore {
    pub fn new(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self { client })
    }

    /// Persist a freshly created record.
    pub async fn create(&self, record: &JobRecord) -> QueueResult<()> {
        self.write(record).await?;
        debug!(job_id = %record.job_id, "created job record");
        Ok(())
    }

    /// Fetch a record; `None` when unknown or expired.
    pub async fn get(&self, id: &JobId) -> QueueResult<Option<JobRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let raw: Option<String> = conn.get(job_key(id)).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Merge an update into the stored record and return the result.
    ///
    /// The monotonic-terminal rule lives in `JobRecord::merge`, so a write
    /// against an already-terminal record is a no-op that still refreshes
    /// the TTL.
    pub async fn update(&self, id: &JobId, update: JobUpdate) -> QueueResult<JobRecord> {
        let mut record = self
            .get(id)
            .await?
            .ok_or_else(|| QueueError::job_not_found(id.as_str()))?;
        record.merge(update);
        self.write(&record).await?;
        Ok(record)
    }

    /// Serialize and `SET EX`, resetting the TTL on every write.
    async fn write(&self, record: &JobRecord) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let json = serde_json::to_string(record)?;
        conn.set_ex::<_, _, ()>(job_key(&record.job_id), json, JOB_TTL_SECS)
            .await?;
        Ok(())
    }
}
