use serde::{Deserialize, Serialize};

use super::{ConnectionStatus, DeviceMetrics};
use crate::values::{DisplayId, OrganizationId, Timestamp};

/// Display record as held by external persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub id: DisplayId,
    pub device_identifier: String,
    pub nickname: String,
    pub organization_id: OrganizationId,
    /// Currently valid credential; replacing or clearing it revokes older tokens
    #[serde(skip_serializing)]
    pub device_token: Option<String>,
    /// False once the display was unpaired or disabled outside the gateway
    pub active: bool,
    pub status: ConnectionStatus,
    pub paired_at: Option<Timestamp>,
    pub last_heartbeat_at: Option<Timestamp>,
    pub current_content_id: Option<String>,
    pub metrics: Option<DeviceMetrics>,
    pub location: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl Display {
    /// A display is paired while it is active and holds a credential
    pub fn is_paired(&self) -> bool {
        self.active && self.device_token.is_some()
    }

    /// Whether `token` is the credential this display currently accepts
    pub fn accepts_token(&self, token: &str) -> bool {
        self.active && self.device_token.as_deref() == Some(token)
    }

    /// Fold a status update into the record, ignoring updates older than
    /// the last heartbeat already stored and any update to an unpaired display
    pub fn apply_status(&mut self, update: &DisplayStatusUpdate) -> bool {
        if !self.active {
            return false;
        }
        if let (Some(stored), Some(incoming)) = (self.last_heartbeat_at, update.last_heartbeat_at)
        {
            if incoming < stored {
                return false;
            }
        }
        self.status = update.status;
        if update.last_heartbeat_at.is_some() {
            self.last_heartbeat_at = update.last_heartbeat_at;
        }
        if update.metrics.is_some() {
            self.metrics = update.metrics.clone();
        }
        if update.current_content_id.is_some() {
            self.current_content_id = update.current_content_id.clone();
        }
        true
    }
}

/// Status change or heartbeat snapshot destined for external persistence
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayStatusUpdate {
    pub display_id: DisplayId,
    pub status: ConnectionStatus,
    pub last_heartbeat_at: Option<Timestamp>,
    pub metrics: Option<DeviceMetrics>,
    pub current_content_id: Option<String>,
    /// Gateway time the update was observed; newer supersedes older
    pub observed_at: Timestamp,
}

impl DisplayStatusUpdate {
    pub fn status_only(display_id: DisplayId, status: ConnectionStatus, at: Timestamp) -> Self {
        Self {
            display_id,
            status,
            last_heartbeat_at: None,
            metrics: None,
            current_content_id: None,
            observed_at: at,
        }
    }
}

/// Playback telemetry forwarded from a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PlaybackReport {
    #[serde(rename_all = "camelCase")]
    Impression {
        content_id: String,
        playlist_id: Option<String>,
        duration: Option<f64>,
        completion_percentage: Option<f64>,
        at: Timestamp,
    },
    #[serde(rename_all = "camelCase")]
    Error {
        content_id: Option<String>,
        error_type: String,
        error_message: Option<String>,
        at: Timestamp,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub content_id: String,
    /// Seconds on screen
    pub duration: u32,
    #[serde(default)]
    pub order: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub playlist_id: String,
    pub items: Vec<PlaylistItem>,
}
