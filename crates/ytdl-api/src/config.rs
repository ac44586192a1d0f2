//! API server configuration.

/// Settings for the HTTP API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Token expected in the X-Api-Token header
    pub api_token: String,
    /// Redis connection for the store, queue and rate limiter
    pub redis_url: String,
    /// Job creations allowed per token per minute
    pub rate_limit_per_minute: u32,
    /// Maximum request body size in bytes
    pub max_body_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            api_token: String::new(),
            redis_url: "redis://localhost:6379".to_string(),
            rate_limit_per_minute: 10,
            max_body_size: 64 * 1024,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            api_token: std::env::var("API_TOKEN").unwrap_or(defaults.api_token),
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            rate_limit_per_minute: std::env::var("RATE_LIMIT_PER_MINUTE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_per_minute),
            max_body_size: defaults.max_body_size,
        }
    }
}
