//! Progress reporting seam between strategies and their caller.

use async_trait::async_trait;
use ytdl_models::ProgressStage;

/// Receives progress updates from a running fetch.
///
/// Strategies report `(stage, percent)` pairs as they work; the worker
/// satisfies this with an adapter that persists updates to the Job Store.
/// Implementations must tolerate out-of-order and repeated reports.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, stage: ProgressStage, pct: u8);
}

/// Sink that discards all updates.
pub struct NullSink;

#[async_trait]
impl ProgressSink for NullSink {
    async fn report(&self, _stage: ProgressStage, _pct: u8) {}
}
