//! Per-job processing pipeline.
//!
//! One invocation drives a queued job through fetch, upload, and the final
//! store write. Failures never propagate to the queue; they are classified
//! and recorded on the job record, and the work item is acked either way.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use ytdl_media::{MediaFetcher, ProgressSink};
use ytdl_models::{JobId, JobUpdate, ProgressStage, Quality};
use ytdl_queue::{DownloadJob, JobStore};
use ytdl_storage::Storage;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Everything a job needs, built once at startup and shared.
pub struct ProcessingContext {
    pub store: JobStore,
    pub storage: Storage,
    pub fetcher: MediaFetcher,
    pub config: WorkerConfig,
    /// Lifetime of download URLs handed to clients
    pub url_expiry_minutes: u32,
}

/// Progress sink that persists updates into the Job Store.
///
/// Write failures are logged and swallowed; a missed progress update must
/// not fail the download.
struct StoreProgress {
    store: JobStore,
    job_id: JobId,
}

#[async_trait]
impl ProgressSink for StoreProgress {
    async fn report(&self, stage: ProgressStage, pct: u8) {
        if let Err(e) = self
            .store
            .update(&self.job_id, JobUpdate::progress(stage, pct))
            .await
        {
            debug!(job_id = %self.job_id, error = %e, "progress write failed");
        }
    }
}

/// Process one work item end to end.
///
/// Missing records (expired before pickup) and already-terminal records are
/// silent no-ops, which makes at-least-once delivery safe.
pub async fn process_job(ctx: &Arc<ProcessingContext>, job: &DownloadJob) -> WorkerResult<()> {
    let job_id = &job.job_id;

    let Some(record) = ctx.store.get(job_id).await? else {
        info!(job_id = %job_id, "job record missing, dropping work item");
        return Ok(());
    };
    if record.is_terminal() {
        info!(job_id = %job_id, status = %record.status, "job already terminal, skipping");
        return Ok(());
    }

    ctx.store
        .update(job_id, JobUpdate::running(ProgressStage::Downloading))
        .await?;

    let work_dir = ctx.config.work_dir.join(job_id.as_str());
    tokio::fs::create_dir_all(&work_dir).await?;

    let timeout_secs = ctx.config.job_timeout.as_secs();
    let result = match tokio::time::timeout(
        ctx.config.job_timeout,
        run_pipeline(ctx, job_id, &record.url, record.quality, &work_dir),
    )
    .await
    {
        Ok(result) => result,
        Err(_) => Err(WorkerError::Timeout(timeout_secs)),
    };

    match &result {
        Ok(()) => info!(job_id = %job_id, "job completed"),
        Err(e) => {
            let code = e.error_code();
            error!(job_id = %job_id, error_code = %code, error = %e, "job failed");
            if let Err(write_err) = ctx
                .store
                .update(job_id, JobUpdate::error(code, e.to_string()))
                .await
            {
                error!(job_id = %job_id, error = %write_err, "failed to record job failure");
            }
        }
    }

    cleanup_work_dir(&work_dir).await;
    Ok(())
}

/// Fetch, upload, and mark done.
async fn run_pipeline(
    ctx: &Arc<ProcessingContext>,
    job_id: &JobId,
    url: &str,
    quality: Quality,
    work_dir: &Path,
) -> WorkerResult<()> {
    let sink = StoreProgress {
        store: ctx.store.clone(),
        job_id: job_id.clone(),
    };

    let media = ctx.fetcher.fetch(url, quality, work_dir, &sink).await?;

    sink.report(ProgressStage::Uploading, 0).await;
    let key = format!("videos/{}/{}", job_id, media.filename);
    ctx.storage.upload(&media.path, &key).await?;

    let (download_url, expires_at) = ctx
        .storage
        .url_for(&key, ctx.url_expiry_minutes)
        .await?;

    ctx.store
        .update(
            job_id,
            JobUpdate::done(download_url, expires_at, media.filename, key),
        )
        .await?;
    Ok(())
}

/// Remove the job's work dir. Runs on every exit path; failures are logged
/// and never escalated.
async fn cleanup_work_dir(work_dir: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(work_dir).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %work_dir.display(), error = %e, "failed to clean up work dir");
        }
    }
}
