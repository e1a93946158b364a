pub mod config;
pub mod credentials;
pub mod event_publisher;
pub mod rate_limiter;
pub mod repositories;
pub mod status_writer;
pub mod tasks;

pub use config::{ConfigError, GatewayConfig};
pub use credentials::JwtCredentialIssuer;
pub use event_publisher::BroadcastEventPublisher;
pub use rate_limiter::TokenBucketRateLimiter;
pub use repositories::{InMemoryDisplayDirectory, InMemoryPairingStore};
pub use status_writer::{FlushReport, StatusWriter};
