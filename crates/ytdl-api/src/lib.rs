//! HTTP API for the ytdl backend.
//!
//! Exposes job submission and status polling over the Job Store and Work
//! Queue, with token auth, Redis-backed rate limiting, and optional
//! long-polling on both endpoints.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use rate_limit::RateLimiter;
pub use routes::create_router;
pub use state::AppState;
