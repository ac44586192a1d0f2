//! Job executor: consumes the work queue with bounded concurrency.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Semaphore};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use ytdl_queue::{DownloadJob, WorkQueue};

use crate::error::WorkerResult;
use crate::processor::{process_job, ProcessingContext};

/// Pulls work items and runs them under a concurrency limit.
pub struct JobExecutor {
    ctx: Arc<ProcessingContext>,
    queue: Arc<WorkQueue>,
    job_semaphore: Arc<Semaphore>,
    shutdown: watch::Sender<bool>,
    consumer_name: String,
}

impl JobExecutor {
    pub fn new(ctx: ProcessingContext, queue: WorkQueue) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_jobs));
        let (shutdown, _) = watch::channel(false);
        let consumer_name = format!("worker-{}", Uuid::new_v4());

        Self {
            ctx: Arc::new(ctx),
            queue: Arc::new(queue),
            job_semaphore,
            shutdown,
            consumer_name,
        }
    }

    /// Handle used to stop the executor from a signal handler.
    pub fn shutdown_handle(&self) -> watch::Sender<bool> {
        self.shutdown.clone()
    }

    /// Run until shutdown is signalled.
    pub async fn run(&self) -> WorkerResult<()> {
        info!(
            consumer = %self.consumer_name,
            max_concurrent_jobs = self.ctx.config.max_concurrent_jobs,
            "starting job executor"
        );

        self.queue.init().await?;

        let claim_task = self.spawn_claim_sweep();
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("shutdown signal received, stopping executor");
                        break;
                    }
                }
                result = self.consume_batch() => {
                    if let Err(e) = result {
                        error!(error = %e, "error consuming work items");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        }

        claim_task.abort();

        info!("waiting for in-flight jobs to finish");
        let _ = tokio::time::timeout(self.ctx.config.shutdown_timeout, self.drain()).await;

        info!("job executor stopped");
        Ok(())
    }

    /// Periodically claim pending items left behind by crashed workers.
    /// Reprocessing a redelivered item is safe: terminal jobs are no-ops.
    fn spawn_claim_sweep(&self) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let consumer_name = self.consumer_name.clone();
        let claim_interval = self.ctx.config.claim_interval;
        let min_idle_ms = self.ctx.config.claim_min_idle.as_millis() as u64;
        let mut shutdown_rx = self.shutdown.subscribe();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(claim_interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        if *shutdown_rx.borrow() {
                            break;
                        }
                    }
                    _ = interval.tick() => {
                        match queue.claim_pending(&consumer_name, min_idle_ms, 5).await {
                            Ok(jobs) if !jobs.is_empty() => {
                                info!(count = jobs.len(), "claimed pending work items");
                                for (message_id, job) in jobs {
                                    let Ok(permit) =
                                        Arc::clone(&semaphore).acquire_owned().await
                                    else {
                                        return;
                                    };
                                    let ctx = Arc::clone(&ctx);
                                    let queue = Arc::clone(&queue);
                                    tokio::spawn(async move {
                                        let _permit = permit;
                                        execute_job(ctx, queue, message_id, job).await;
                                    });
                                }
                            }
                            Ok(_) => {}
                            Err(e) => warn!(error = %e, "failed to claim pending items"),
                        }
                    }
                }
            }
        })
    }

    /// Read and dispatch up to the free concurrency slots.
    async fn consume_batch(&self) -> WorkerResult<()> {
        let available = self.job_semaphore.available_permits();
        if available == 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            return Ok(());
        }

        let jobs = self
            .queue
            .consume(&self.consumer_name, 1000, available.min(5))
            .await?;
        if jobs.is_empty() {
            return Ok(());
        }
        debug!(count = jobs.len(), "consumed work items");

        for (message_id, job) in jobs {
            let Ok(permit) = Arc::clone(&self.job_semaphore).acquire_owned().await else {
                return Ok(());
            };
            let ctx = Arc::clone(&self.ctx);
            let queue = Arc::clone(&self.queue);
            tokio::spawn(async move {
                let _permit = permit;
                execute_job(ctx, queue, message_id, job).await;
            });
        }
        Ok(())
    }

    /// Wait until every permit is free again.
    async fn drain(&self) {
        let total = self.ctx.config.max_concurrent_jobs;
        let _ = self.job_semaphore.acquire_many(total as u32).await;
    }
}

/// Process one item and always ack it. Pipeline failures are recorded on
/// the job record inside `process_job`; there is no retry or dead-letter
/// path, callers resubmit instead.
async fn execute_job(
    ctx: Arc<ProcessingContext>,
    queue: Arc<WorkQueue>,
    message_id: String,
    job: DownloadJob,
) {
    info!(job_id = %job.job_id, message_id, "executing job");

    if let Err(e) = process_job(&ctx, &job).await {
        // Only store/Redis communication errors end up here.
        error!(job_id = %job.job_id, error = %e, "job processing aborted");
    }

    if let Err(e) = queue.ack(&message_id).await {
        error!(job_id = %job.job_id, message_id, error = %e, "failed to ack work item");
    }
}
