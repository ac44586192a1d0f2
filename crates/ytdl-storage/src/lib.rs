//! Storage gateway for the ytdl backend.
//!
//! Artifacts are uploaded under a key and retrieved through a time-limited
//! URL. Two backends are supported, selected by configuration: a local
//! filesystem directory (development, single host) and Cloudflare R2 over
//! the S3 API (production).

pub mod error;
pub mod gateway;
pub mod local;
pub mod r2;

pub use error::{StorageError, StorageResult};
pub use gateway::{Storage, StorageConfig, StorageMode};
pub use local::LocalStorage;
pub use r2::{R2Config, R2Storage};
