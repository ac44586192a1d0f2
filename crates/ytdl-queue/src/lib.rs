//! Redis persistence for the ytdl backend.
//!
//! Two components share one Redis instance: the [`JobStore`] keeps the
//! durable job records (string keys with a rolling TTL), and the
//! [`WorkQueue`] carries work items on a stream consumed through a
//! consumer group.

pub mod error;
pub mod job;
pub mod queue;
pub mod store;

pub use error::{QueueError, QueueResult};
pub use job::DownloadJob;
pub use queue::{QueueConfig, WorkQueue};
pub use store::JobStore;
