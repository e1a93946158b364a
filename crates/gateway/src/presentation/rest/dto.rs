use serde::{Deserialize, Serialize};
use vizora_core::{ConnectionStatus, Display, DisplayId, PairingStatus, PlaylistItem, Timestamp};

use crate::application::{ActivePairing, Delivery};

// ============================================================================
// Pairing
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPairingRequest {
    pub device_identifier: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPairingResponse {
    pub code: String,
    pub expires_at: Timestamp,
    pub expires_in_seconds: i64,
    pub pairing_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingStatusResponse {
    pub status: PairingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_id: Option<DisplayId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePairingRequest {
    pub code: String,
    #[serde(default)]
    pub nickname: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletePairingResponse {
    pub display: DisplayResponse,
    pub device_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayResponse {
    pub id: DisplayId,
    pub nickname: String,
    pub device_identifier: String,
    pub organization_id: String,
    pub status: ConnectionStatus,
    pub paired_at: Option<Timestamp>,
    pub location: Option<String>,
}

impl From<Display> for DisplayResponse {
    fn from(display: Display) -> Self {
        DisplayResponse {
            id: display.id,
            nickname: display.nickname,
            device_identifier: display.device_identifier,
            organization_id: display.organization_id,
            status: display.status,
            paired_at: display.paired_at,
            location: display.location,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivePairingResponse {
    pub code: String,
    pub nickname: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl From<ActivePairing> for ActivePairingResponse {
    fn from(pairing: ActivePairing) -> Self {
        ActivePairingResponse {
            code: pairing.code.to_string(),
            nickname: pairing.nickname,
            created_at: pairing.created_at,
            expires_at: pairing.expires_at,
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushContentRequest {
    pub content_id: String,
    #[serde(default)]
    pub duration: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPlaylistRequest {
    pub playlist_id: String,
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub delivery: Delivery,
}

// ============================================================================
// Misc
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub connected_devices: usize,
    pub dashboard_listeners: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ErrorResponse {
            code: code.into(),
            message: message.into(),
        }
    }
}
