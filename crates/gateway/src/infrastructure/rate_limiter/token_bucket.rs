use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::application::ports::{
    ConnectionRateLimiter, MessageRateLimiter, RateLimitConfig, RateLimitResult,
};

/// Token bucket rate limiter implementation
///
/// Two independent keyspaces:
/// - connection attempts, keyed by client IP (per minute)
/// - inbound realtime messages, keyed by connection (per second)
pub struct TokenBucketRateLimiter {
    config: RateLimitConfig,
    connections: Arc<DashMap<String, Mutex<TokenBucket>>>,
    messages: Arc<DashMap<String, Mutex<TokenBucket>>>,
}

struct TokenBucket {
    tokens: f64,
    capacity: f64,
    refill_rate: f64, // tokens per second
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, refill_interval: Duration) -> Self {
        let refill_rate = capacity as f64 / refill_interval.as_secs_f64();
        TokenBucket {
            tokens: capacity as f64,
            capacity: capacity as f64,
            refill_rate,
            last_update: Instant::now(),
        }
    }

    fn try_consume(&mut self, amount: u32) -> (bool, Duration) {
        self.refill();

        let amount_f64 = amount as f64;
        if self.tokens >= amount_f64 {
            self.tokens -= amount_f64;
            (true, Duration::ZERO)
        } else {
            // Calculate wait time
            let deficit = amount_f64 - self.tokens;
            let wait_seconds = deficit / self.refill_rate;
            (false, Duration::from_secs_f64(wait_seconds))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update);
        let new_tokens = elapsed.as_secs_f64() * self.refill_rate;
        self.tokens = (self.tokens + new_tokens).min(self.capacity);
        self.last_update = now;
    }

    fn is_full(&mut self) -> bool {
        self.refill();
        self.tokens >= self.capacity
    }

    fn current(&self) -> u32 {
        (self.capacity - self.tokens) as u32
    }

    fn limit(&self) -> u32 {
        self.capacity as u32
    }

    fn check(&mut self) -> RateLimitResult {
        let (allowed, retry_after) = self.try_consume(1);
        if allowed {
            RateLimitResult::allowed(self.current(), self.limit())
        } else {
            RateLimitResult::denied(self.current(), self.limit(), retry_after)
        }
    }
}

impl TokenBucketRateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        TokenBucketRateLimiter {
            config,
            connections: Arc::new(DashMap::new()),
            messages: Arc::new(DashMap::new()),
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Client addresses currently holding a connection bucket
    pub fn tracked_clients(&self) -> usize {
        self.connections.len()
    }

    fn check_in(
        buckets: &DashMap<String, Mutex<TokenBucket>>,
        key: &str,
        create: impl FnOnce() -> TokenBucket,
    ) -> RateLimitResult {
        let entry = buckets
            .entry(key.to_string())
            .or_insert_with(|| Mutex::new(create()));
        let result = entry.value().lock().check();
        result
    }
}

impl Default for TokenBucketRateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl Clone for TokenBucketRateLimiter {
    fn clone(&self) -> Self {
        TokenBucketRateLimiter {
            config: self.config.clone(),
            connections: Arc::clone(&self.connections),
            messages: Arc::clone(&self.messages),
        }
    }
}

impl ConnectionRateLimiter for TokenBucketRateLimiter {
    fn check_connection(&self, client_ip: &str) -> RateLimitResult {
        let limit = self.config.connections_per_ip_per_minute;
        Self::check_in(&self.connections, client_ip, || {
            TokenBucket::new(limit, Duration::from_secs(60))
        })
    }

    fn prune_idle(&self) -> usize {
        let before = self.connections.len();
        // A full bucket behaves exactly like a fresh one
        self.connections
            .retain(|_, bucket| !bucket.get_mut().is_full());
        before.saturating_sub(self.connections.len())
    }
}

impl MessageRateLimiter for TokenBucketRateLimiter {
    fn check_message(&self, connection_key: &str) -> RateLimitResult {
        let limit = self.config.messages_per_second;
        Self::check_in(&self.messages, connection_key, || {
            TokenBucket::new(limit, Duration::from_secs(1))
        })
    }

    fn forget(&self, connection_key: &str) {
        self.messages.remove(connection_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit() {
        let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
            connections_per_ip_per_minute: 3,
            ..Default::default()
        });

        // Should allow first attempts
        for _ in 0..3 {
            assert!(limiter.check_connection("10.0.0.1").allowed);
        }

        // Should deny when limit exceeded
        let result = limiter.check_connection("10.0.0.1");
        assert!(!result.allowed);
        assert!(result.retry_after.is_some());
        assert_eq!(result.limit, 3);
    }

    #[test]
    fn test_per_client_isolation() {
        let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
            connections_per_ip_per_minute: 2,
            ..Default::default()
        });

        // Exhaust the first address
        limiter.check_connection("10.0.0.1");
        limiter.check_connection("10.0.0.1");
        assert!(!limiter.check_connection("10.0.0.1").allowed);

        // Another address should still have quota
        assert!(limiter.check_connection("10.0.0.2").allowed);
    }

    #[test]
    fn test_prune_drops_recovered_clients_only() {
        let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
            connections_per_ip_per_minute: 6000,
            ..Default::default()
        });
        for i in 0..1000 {
            assert!(limiter.check_connection(&format!("10.0.{}.{}", i / 256, i % 256)).allowed);
        }
        assert_eq!(limiter.tracked_clients(), 1000);

        // 100 tokens per second; one token is back well within 50ms
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(limiter.prune_idle(), 1000);
        assert_eq!(limiter.tracked_clients(), 0);
    }

    #[test]
    fn test_prune_keeps_exhausted_clients() {
        let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
            connections_per_ip_per_minute: 1,
            ..Default::default()
        });
        assert!(limiter.check_connection("10.0.0.1").allowed);
        assert!(!limiter.check_connection("10.0.0.1").allowed);

        assert_eq!(limiter.prune_idle(), 0);
        assert!(!limiter.check_connection("10.0.0.1").allowed);
    }

    #[test]
    fn test_message_limit_and_forget() {
        let limiter = TokenBucketRateLimiter::new(RateLimitConfig {
            messages_per_second: 2,
            ..Default::default()
        });

        assert!(limiter.check_message("conn-1").allowed);
        assert!(limiter.check_message("conn-1").allowed);
        assert!(!limiter.check_message("conn-1").allowed);

        limiter.forget("conn-1");
        assert!(limiter.check_message("conn-1").allowed);
    }
}
