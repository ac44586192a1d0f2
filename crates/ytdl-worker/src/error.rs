//! Worker error types and terminal-error classification.

use thiserror::Error;
use ytdl_media::FetchError;
use ytdl_models::ErrorCode;
use ytdl_queue::QueueError;
use ytdl_storage::StorageError;

/// Errors from job processing.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Queue(#[from] QueueError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("job timed out after {0} seconds")]
    Timeout(u64),
}

impl WorkerError {
    /// Map a processing failure to the stable code written on the job.
    /// Anything unclassified is an internal error.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            WorkerError::Fetch(e) => e.error_code(),
            WorkerError::Storage(e) => e.error_code(),
            WorkerError::Queue(_) | WorkerError::Io(_) | WorkerError::Timeout(_) => {
                ErrorCode::InternalError
            }
        }
    }
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;
