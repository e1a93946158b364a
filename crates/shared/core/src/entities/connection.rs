use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::values::{ConnectionId, DisplayId, OrganizationId, Timestamp};

/// Liveness status of a display as seen by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Online,
    Idle,
    Error,
    Offline,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionStatus::Offline)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Online => "online",
            ConnectionStatus::Idle => "idle",
            ConnectionStatus::Error => "error",
            ConnectionStatus::Offline => "offline",
        }
    }
}

/// Resource usage reported by a device, in percent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_usage: Option<f64>,
    /// Anything else the player reports (temperature, uptime, ...)
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// One heartbeat's worth of liveness data
#[derive(Debug, Clone, PartialEq)]
pub struct HeartbeatUpdate {
    /// When the gateway received the heartbeat
    pub received_at: Timestamp,
    /// Timestamp stamped by the device; orders heartbeats of one device
    pub reported_at: Timestamp,
    pub status: ConnectionStatus,
    pub metrics: Option<DeviceMetrics>,
    pub content_id: Option<String>,
}

/// Read model of a live connection's registry entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConnection {
    pub display_id: DisplayId,
    pub connection_id: ConnectionId,
    pub organization_id: OrganizationId,
    pub status: ConnectionStatus,
    pub connected_at: Timestamp,
    pub last_heartbeat_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_reported_at: Option<Timestamp>,
    pub metrics: DeviceMetrics,
    pub current_content_id: Option<String>,
}
