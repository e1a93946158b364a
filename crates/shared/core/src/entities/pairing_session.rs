use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::values::{DisplayId, OrganizationId, Timestamp};

/// Human-enterable pairing code shown on the display
///
/// Codes are upper-case and drawn from an alphabet without the look-alike
/// characters `0`, `O`, `1` and `I`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairingCode(String);

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidPairingCode {
    #[error("pairing code must be {min}-{max} characters, got {len}")]
    Length { len: usize, min: usize, max: usize },

    #[error("pairing code contains invalid character '{0}'")]
    Character(char),
}

impl PairingCode {
    /// Characters a code may contain
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    /// Default code length
    pub const DEFAULT_LENGTH: usize = 6;
    const MIN_LENGTH: usize = 4;
    const MAX_LENGTH: usize = 12;

    /// Parse user input, normalizing case and surrounding whitespace
    pub fn parse(input: &str) -> Result<Self, InvalidPairingCode> {
        let code = input.trim().to_ascii_uppercase();
        let len = code.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(InvalidPairingCode::Length {
                len,
                min: Self::MIN_LENGTH,
                max: Self::MAX_LENGTH,
            });
        }
        if let Some(bad) = code
            .chars()
            .find(|c| !c.is_ascii() || !Self::ALPHABET.contains(&(*c as u8)))
        {
            return Err(InvalidPairingCode::Character(bad));
        }
        Ok(Self(code))
    }

    /// Build a code from alphabet indices (used by code generators)
    pub fn from_indices(indices: impl IntoIterator<Item = usize>) -> Self {
        let code = indices
            .into_iter()
            .map(|i| Self::ALPHABET[i % Self::ALPHABET.len()] as char)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pairing session lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PairingStatus {
    /// Waiting for a dashboard user to enter the code
    Pending,
    /// Claimed by an organization; a device token has been issued
    Paired,
    /// Aged out before (or after) being claimed
    Expired,
}

/// Claim of a pending session by an organization
///
/// The device token is minted before the claim so that the
/// `pending -> paired` transition and the token become visible together.
#[derive(Debug, Clone)]
pub struct PairingClaim {
    pub organization_id: OrganizationId,
    pub display_id: DisplayId,
    pub device_token: String,
    pub nickname: Option<String>,
}

/// A device's request to be paired, keyed by its code
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingSession {
    pub id: Uuid,
    pub code: PairingCode,
    pub device_identifier: String,
    pub nickname: String,
    /// Opaque device-supplied info (hostname, os, resolution, ...)
    pub metadata: serde_json::Value,
    /// Stored status; use [`PairingSession::status_at`] to read it
    pub status: PairingStatus,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub claimed_by_organization_id: Option<OrganizationId>,
    pub display_id: Option<DisplayId>,
    pub issued_device_token: Option<String>,
}

impl PairingSession {
    pub const DEFAULT_NICKNAME: &'static str = "Unnamed Display";

    pub fn new(
        code: PairingCode,
        device_identifier: impl Into<String>,
        nickname: Option<String>,
        metadata: serde_json::Value,
        created_at: Timestamp,
        ttl: Duration,
    ) -> Self {
        let nickname = nickname
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_NICKNAME.to_string());

        Self {
            id: Uuid::new_v4(),
            code,
            device_identifier: device_identifier.into(),
            nickname,
            metadata,
            status: PairingStatus::Pending,
            created_at,
            expires_at: created_at + ttl,
            claimed_by_organization_id: None,
            display_id: None,
            issued_device_token: None,
        }
    }

    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Effective status at `now`; a session past `expires_at` is expired
    /// whatever its stored status
    pub fn status_at(&self, now: Timestamp) -> PairingStatus {
        if self.is_expired_at(now) {
            PairingStatus::Expired
        } else {
            self.status
        }
    }

    /// Seconds until expiry, clamped at zero
    pub fn remaining_secs(&self, now: Timestamp) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }

    /// Apply a claim. Callers must hold exclusive access to the session.
    pub fn mark_paired(&mut self, claim: PairingClaim) {
        self.status = PairingStatus::Paired;
        self.claimed_by_organization_id = Some(claim.organization_id);
        self.display_id = Some(claim.display_id);
        self.issued_device_token = Some(claim.device_token);
        if let Some(nickname) = claim.nickname.filter(|n| !n.trim().is_empty()) {
            self.nickname = nickname;
        }
    }

    /// Undo a claim whose follow-up persistence failed
    pub fn reset_to_pending(&mut self) {
        self.status = PairingStatus::Pending;
        self.claimed_by_organization_id = None;
        self.display_id = None;
        self.issued_device_token = None;
    }
}
