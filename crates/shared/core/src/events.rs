//! Events fanned out to dashboard listeners

use serde::Serialize;

use crate::entities::ConnectionStatus;
use crate::values::{DisplayId, OrganizationId, Timestamp};

/// Event published to dashboard listeners
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum DashboardEvent {
    /// A pairing code was claimed
    #[serde(rename = "display:paired", rename_all = "camelCase")]
    DisplayPaired {
        code: String,
        display_id: DisplayId,
        organization_id: OrganizationId,
        nickname: String,
        timestamp: Timestamp,
    },
    /// A display went online/offline or changed liveness status
    #[serde(rename = "device:status", rename_all = "camelCase")]
    DeviceStatus {
        display_id: DisplayId,
        organization_id: OrganizationId,
        status: ConnectionStatus,
        timestamp: Timestamp,
    },
}

impl DashboardEvent {
    pub fn organization_id(&self) -> &str {
        match self {
            DashboardEvent::DisplayPaired {
                organization_id, ..
            }
            | DashboardEvent::DeviceStatus {
                organization_id, ..
            } => organization_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DashboardEvent::DisplayPaired { .. } => "display:paired",
            DashboardEvent::DeviceStatus { .. } => "device:status",
        }
    }
}
