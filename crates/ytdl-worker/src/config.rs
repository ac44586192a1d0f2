//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Settings for the job executor and the per-job pipeline.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How many jobs may run at once
    pub max_concurrent_jobs: usize,
    /// Parent directory for per-job work dirs
    pub work_dir: PathBuf,
    /// Hard limit on one job's processing time
    pub job_timeout: Duration,
    /// How often to sweep for pending items from crashed workers
    pub claim_interval: Duration,
    /// Minimum idle time before a pending item is claimed
    pub claim_min_idle: Duration,
    /// How long to wait for in-flight jobs on shutdown
    pub shutdown_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            work_dir: PathBuf::from("/tmp/ytdl-downloads"),
            job_timeout: Duration::from_secs(600),
            claim_interval: Duration::from_secs(30),
            claim_min_idle: Duration::from_secs(300),
            shutdown_timeout: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        fn env_secs(name: &str) -> Option<Duration> {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
        }

        Self {
            max_concurrent_jobs: std::env::var("MAX_CONCURRENT_JOBS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_concurrent_jobs),
            work_dir: std::env::var("WORK_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.work_dir),
            job_timeout: env_secs("JOB_TIMEOUT_SECS").unwrap_or(defaults.job_timeout),
            claim_interval: env_secs("CLAIM_INTERVAL_SECS").unwrap_or(defaults.claim_interval),
            claim_min_idle: env_secs("CLAIM_MIN_IDLE_SECS").unwrap_or(defaults.claim_min_idle),
            shutdown_timeout: env_secs("SHUTDOWN_TIMEOUT_SECS")
                .unwrap_or(defaults.shutdown_timeout),
        }
    }
}
