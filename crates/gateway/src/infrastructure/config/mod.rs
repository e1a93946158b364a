//! Configuration loading for the display gateway
//!
//! Supports JSON configuration files for:
//! - Server binding and the public dashboard URL
//! - Pairing code shape and lifetime
//! - Device credential signing
//! - Heartbeat, sweep and status flush timing
//! - Push delivery and rate limits
//!
//! Every field has a default, so `{}` is a valid configuration. A few
//! settings can be overridden from the environment (`HOST`, `PORT`,
//! `DEVICE_JWT_SECRET`, `WEB_URL`).

use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::application::ports::RateLimitConfig;

/// Shortest accepted signing secret, in bytes
const MIN_SECRET_LEN: usize = 32;

/// Upper bound for configured durations (one year)
const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Upper bound for credential validity (ten years)
const MAX_VALIDITY_DAYS: u32 = 3650;

/// Root configuration for the display gateway
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Pairing session configuration
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Device credential configuration
    #[serde(default)]
    pub credentials: CredentialConfig,

    /// Heartbeat and liveness configuration
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,

    /// Push delivery configuration
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Settings sent to devices when they connect
    #[serde(default)]
    pub player: PlayerConfig,

    /// Rate limiting configuration
    #[serde(default)]
    pub rate_limits: RateLimitConfig,
}

impl GatewayConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::Invalid {
                field: "PORT",
                reason: format!("'{}' is not a port number", port),
            })?;
        }
        if let Some(secret) = lookup("DEVICE_JWT_SECRET") {
            self.credentials.secret = Some(secret);
        }
        if let Some(url) = lookup("WEB_URL") {
            self.server.public_url = url;
        }
        Ok(())
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        let code_length = self.pairing.code_length;
        if !(4..=12).contains(&code_length) {
            return Err(ConfigError::Invalid {
                field: "pairing.code_length",
                reason: format!("must be between 4 and 12, got {}", code_length),
            });
        }
        if self.pairing.ttl_secs == 0 || self.pairing.ttl_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid {
                field: "pairing.ttl_secs",
                reason: format!("must be between 1 and {}", MAX_DURATION_SECS),
            });
        }
        if self.pairing.retention_secs > MAX_DURATION_SECS {
            return Err(ConfigError::Invalid {
                field: "pairing.retention_secs",
                reason: format!("must be at most {}", MAX_DURATION_SECS),
            });
        }
        if let Some(secret) = &self.credentials.secret {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ConfigError::Invalid {
                    field: "credentials.secret",
                    reason: format!("must be at least {} bytes", MIN_SECRET_LEN),
                });
            }
        }
        if self.credentials.validity_days == 0 || self.credentials.validity_days > MAX_VALIDITY_DAYS
        {
            return Err(ConfigError::Invalid {
                field: "credentials.validity_days",
                reason: format!("must be between 1 and {}", MAX_VALIDITY_DAYS),
            });
        }
        if self.heartbeat.interval_ms == 0 || self.heartbeat.missed_limit == 0 {
            return Err(ConfigError::Invalid {
                field: "heartbeat",
                reason: "interval_ms and missed_limit must be positive".to_string(),
            });
        }
        let timeout_fits = self
            .heartbeat
            .interval_ms
            .checked_mul(self.heartbeat.missed_limit as u64)
            .is_some_and(|ms| ms <= MAX_DURATION_SECS * 1000);
        if !timeout_fits {
            return Err(ConfigError::Invalid {
                field: "heartbeat",
                reason: format!(
                    "interval_ms * missed_limit must be at most {}ms",
                    MAX_DURATION_SECS * 1000
                ),
            });
        }
        if self.heartbeat.revalidate_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "heartbeat.revalidate_timeout_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.heartbeat.sweep_interval_ms == 0
            || self.heartbeat.sweep_interval_ms >= self.heartbeat.timeout_ms()
        {
            return Err(ConfigError::Invalid {
                field: "heartbeat.sweep_interval_ms",
                reason: format!(
                    "must be positive and below the heartbeat timeout ({}ms)",
                    self.heartbeat.timeout_ms()
                ),
            });
        }
        if self.heartbeat.flush_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "heartbeat.flush_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        if self.rate_limits.connections_per_ip_per_minute == 0
            || self.rate_limits.messages_per_second == 0
        {
            return Err(ConfigError::Invalid {
                field: "rate_limits",
                reason: "limits must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Capacity of each dashboard broadcast channel
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
    /// Base URL of the dashboard, used to build pairing links
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3002
}

fn default_event_capacity() -> usize {
    1024
}

fn default_public_url() -> String {
    "http://localhost:3001".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            event_capacity: default_event_capacity(),
            public_url: default_public_url(),
        }
    }
}

/// Pairing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,
    /// Lifetime of a pairing session
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// How long expired sessions stay readable before purge
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_code_length() -> usize {
    6
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_retention_secs() -> u64 {
    3600
}

fn default_purge_interval_secs() -> u64 {
    60
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_secs: default_ttl_secs(),
            retention_secs: default_retention_secs(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

impl PairingConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_secs as i64)
    }

    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.retention_secs as i64)
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.max(1))
    }
}

/// Device credential configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    /// HS256 signing secret; a random one is generated when absent
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default = "default_validity_days")]
    pub validity_days: u32,
}

fn default_validity_days() -> u32 {
    365
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            secret: None,
            validity_days: default_validity_days(),
        }
    }
}

impl CredentialConfig {
    pub fn validity(&self) -> chrono::Duration {
        chrono::Duration::days(self.validity_days as i64)
    }

    /// Signing key bytes
    ///
    /// Without a configured secret, tokens do not survive a restart.
    pub fn signing_key(&self) -> Vec<u8> {
        match &self.secret {
            Some(secret) => secret.as_bytes().to_vec(),
            None => {
                warn!("No credentials.secret configured; generating an ephemeral signing key");
                let mut key = vec![0u8; MIN_SECRET_LEN];
                OsRng.fill_bytes(&mut key);
                key
            }
        }
    }
}

/// Heartbeat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatConfig {
    /// Interval devices are told to heartbeat at
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Missed intervals before a device is swept offline
    #[serde(default = "default_missed_limit")]
    pub missed_limit: u32,
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    /// Interval of the coalesced status flush
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    /// Longest a heartbeat waits on the directory re-check
    #[serde(default = "default_revalidate_timeout_ms")]
    pub revalidate_timeout_ms: u64,
}

fn default_interval_ms() -> u64 {
    15_000
}

fn default_missed_limit() -> u32 {
    3
}

fn default_sweep_interval_ms() -> u64 {
    5_000
}

fn default_flush_interval_ms() -> u64 {
    30_000
}

fn default_revalidate_timeout_ms() -> u64 {
    2_000
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            missed_limit: default_missed_limit(),
            sweep_interval_ms: default_sweep_interval_ms(),
            flush_interval_ms: default_flush_interval_ms(),
            revalidate_timeout_ms: default_revalidate_timeout_ms(),
        }
    }
}

impl HeartbeatConfig {
    /// `interval_ms * missed_limit`, saturating; `validate` rejects overflow
    pub fn timeout_ms(&self) -> u64 {
        self.interval_ms.saturating_mul(self.missed_limit as u64)
    }

    /// Silence after which a device is considered gone
    pub fn timeout(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.timeout_ms() as i64)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn revalidate_timeout(&self) -> Duration {
        Duration::from_millis(self.revalidate_timeout_ms)
    }
}

/// Push delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// How long a push waits for room in a connection's buffer
    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,
    /// Outbound messages buffered per connection
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

fn default_send_timeout_ms() -> u64 {
    2_000
}

fn default_outbound_buffer() -> usize {
    64
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: default_send_timeout_ms(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

impl DispatchConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }
}

/// Player settings pushed in the `config` event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_cache_size_bytes")]
    pub cache_size_bytes: u64,
    #[serde(default = "default_auto_update")]
    pub auto_update: bool,
}

fn default_cache_size_bytes() -> u64 {
    500 * 1024 * 1024
}

fn default_auto_update() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            cache_size_bytes: default_cache_size_bytes(),
            auto_update: default_auto_update(),
        }
    }
}

/// Configuration errors
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_minimal_config() {
        let config = GatewayConfig::from_json("{}").unwrap();
        assert_eq!(config.server.port, 3002);
        assert_eq!(config.pairing.code_length, 6);
        assert_eq!(config.pairing.ttl_secs, 600);
        assert_eq!(config.credentials.validity_days, 365);
        assert_eq!(config.heartbeat.timeout_ms(), 45_000);
        assert_eq!(config.dispatch.send_timeout(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_sections() {
        let json = r#"{
            "server": { "port": 9000, "public_url": "https://app.example.com" },
            "heartbeat": { "interval_ms": 1000, "missed_limit": 5, "sweep_interval_ms": 500 },
            "rate_limits": { "messages_per_second": 3 }
        }"#;
        let config = GatewayConfig::from_json(json).unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.heartbeat.timeout(), chrono::Duration::seconds(5));
        assert_eq!(config.rate_limits.messages_per_second, 3);
        assert_eq!(config.rate_limits.connections_per_ip_per_minute, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        assert!(matches!(
            GatewayConfig::from_json("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.pairing.code_length = 3;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "pairing.code_length",
                ..
            })
        ));

        let mut config = GatewayConfig::default();
        config.credentials.secret = Some("short".into());
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.heartbeat.sweep_interval_ms = config.heartbeat.timeout_ms();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_durations() {
        let mut config = GatewayConfig::default();
        config.heartbeat.interval_ms = u64::MAX;
        config.heartbeat.missed_limit = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "heartbeat",
                ..
            })
        ));

        let mut config = GatewayConfig::default();
        config.pairing.ttl_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "pairing.ttl_secs",
                ..
            })
        ));

        let mut config = GatewayConfig::default();
        config.pairing.retention_secs = u64::MAX;
        assert!(config.validate().is_err());

        let mut config = GatewayConfig::default();
        config.credentials.validity_days = u32::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "credentials.validity_days",
                ..
            })
        ));

        let json = r#"{ "heartbeat": { "interval_ms": 18446744073709551615, "missed_limit": 4294967295 } }"#;
        let config = GatewayConfig::from_json(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("PORT", "4100"),
            ("WEB_URL", "https://dash.example.com"),
            ("DEVICE_JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ]);
        let mut config = GatewayConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.server.port, 4100);
        assert_eq!(config.server.public_url, "https://dash.example.com");
        assert_eq!(
            config.credentials.signing_key(),
            b"0123456789abcdef0123456789abcdef".to_vec()
        );
        assert!(config.validate().is_ok());

        let bad_port = GatewayConfig::default().apply_overrides(|key| {
            (key == "PORT").then(|| "not-a-port".to_string())
        });
        assert!(bad_port.is_err());
    }
}
