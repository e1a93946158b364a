use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for rate limiting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Device connection attempts per client IP per minute
    #[serde(default = "default_connections_per_ip_per_minute")]
    pub connections_per_ip_per_minute: u32,
    /// Inbound realtime messages per connection per second
    #[serde(default = "default_messages_per_second")]
    pub messages_per_second: u32,
}

fn default_connections_per_ip_per_minute() -> u32 {
    30
}

fn default_messages_per_second() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        RateLimitConfig {
            connections_per_ip_per_minute: default_connections_per_ip_per_minute(),
            messages_per_second: default_messages_per_second(),
        }
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub struct RateLimitResult {
    /// Whether the request is allowed
    pub allowed: bool,
    /// Current usage
    pub current: u32,
    /// Maximum allowed
    pub limit: u32,
    /// Time until enough quota is available again
    pub retry_after: Option<Duration>,
}

impl RateLimitResult {
    pub fn allowed(current: u32, limit: u32) -> Self {
        RateLimitResult {
            allowed: true,
            current,
            limit,
            retry_after: None,
        }
    }

    pub fn denied(current: u32, limit: u32, retry_after: Duration) -> Self {
        RateLimitResult {
            allowed: false,
            current,
            limit,
            retry_after: Some(retry_after),
        }
    }
}

/// Rate limiter for device connection attempts, keyed by client IP
pub trait ConnectionRateLimiter: Send + Sync {
    fn check_connection(&self, client_ip: &str) -> RateLimitResult;

    /// Drop per-client state that has fully recovered; returns how many
    /// clients were forgotten
    fn prune_idle(&self) -> usize;
}

/// Rate limiter for inbound realtime messages, keyed by connection
pub trait MessageRateLimiter: Send + Sync {
    fn check_message(&self, connection_key: &str) -> RateLimitResult;

    /// Drop state kept for a closed connection
    fn forget(&self, connection_key: &str);
}
