use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::values::{DisplayId, OrganizationId};

/// Kind of principal a credential was minted for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialType {
    Device,
    /// Any credential type this gateway does not accept
    #[serde(other)]
    Other,
}

/// Claims carried by a device credential
///
/// Timestamps are unix seconds, matching the compact token format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClaims {
    /// Display (device) id
    pub sub: DisplayId,
    /// Unique per issue, so re-pairing never reproduces an earlier token
    pub jti: Uuid,
    pub device_identifier: String,
    pub organization_id: OrganizationId,
    #[serde(rename = "type")]
    pub credential_type: CredentialType,
    pub iat: i64,
    pub exp: i64,
}

impl DeviceClaims {
    pub fn display_id(&self) -> DisplayId {
        self.sub
    }

    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        now_secs >= self.exp
    }
}
