//! Per-token rate limiting backed by Redis.

use tracing::warn;

use crate::error::{ApiError, ApiResult};

const WINDOW_SECS: i64 = 60;

/// Counts job creations per token in a rolling one-minute window.
///
/// The counter lives in Redis (`rate:{token}`) so every API replica shares
/// the same budget. INCR and EXPIRE run as one pipeline on every request,
/// so the window re-arms under sustained traffic and the counter can never
/// outlive it.
#[derive(Clone)]
pub struct RateLimiter {
    client: redis::Client,
    limit: u32,
}

impl RateLimiter {
    pub fn new(redis_url: &str, limit: u32) -> ApiResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| ApiError::internal(format!("invalid redis url: {e}")))?;
        Ok(Self { client, limit })
    }

    /// Count this request; errors with `RateLimited` once the caller is
    /// over budget for the current window.
    pub async fn check(&self, token: &str) -> ApiResult<()> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?;

        let key = format!("rate:{token}");
        let (count,): (u32,) = redis::pipe()
            .atomic()
            .incr(&key, 1)
            .expire(&key, WINDOW_SECS)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| ApiError::internal(e.to_string()))?;

        if count > self.limit {
            warn!(count, limit = self.limit, "rate limit exceeded");
            return Err(ApiError::RateLimited);
        }
        Ok(())
    }
}
