//! Shared data models for the ytdl backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job records, states and progress snapshots
//! - Requested video quality and its strategy mappings
//! - The API error taxonomy
//! - Request/response payloads
//! - URL validation and filename sanitization helpers

pub mod api;
pub mod error_code;
pub mod job;
pub mod quality;
pub mod utils;

// Re-export common types
pub use api::{CreateJobRequest, CreateJobResponse, JobStatusResponse};
pub use error_code::ErrorCode;
pub use job::{JobId, JobProgress, JobRecord, JobStatus, JobUpdate, ProgressStage};
pub use quality::Quality;
pub use utils::{extract_video_id, sanitize_filename, validate_video_url, UrlError};
