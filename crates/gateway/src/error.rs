//! Error types for the gateway crate

use thiserror::Error;

use crate::infrastructure::ConfigError;

/// Failures starting or running the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
