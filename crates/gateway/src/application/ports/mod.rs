mod event_publisher;
mod rate_limiter;
mod status_sink;

pub use event_publisher::{EventPublisher, Topic};
pub use rate_limiter::{
    ConnectionRateLimiter, MessageRateLimiter, RateLimitConfig, RateLimitResult,
};
pub use status_sink::StatusSink;
