//! Shared application state.

use std::sync::Arc;

use ytdl_queue::{JobStore, WorkQueue};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::rate_limit::RateLimiter;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub store: JobStore,
    pub queue: Arc<WorkQueue>,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: ApiConfig, store: JobStore, queue: WorkQueue) -> ApiResult<Self> {
        let rate_limiter = RateLimiter::new(&config.redis_url, config.rate_limit_per_minute)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            queue: Arc::new(queue),
            rate_limiter,
        })
    }
}
