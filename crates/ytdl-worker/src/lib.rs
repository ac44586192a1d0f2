//! Job coordinator for the ytdl backend.
//!
//! Consumes work items from the Redis stream and drives each job through
//! fetch, upload, and job-record updates with bounded concurrency.

pub mod config;
pub mod error;
pub mod executor;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use processor::{process_job, ProcessingContext};
