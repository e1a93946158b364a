use vizora_core::{DeviceClaims, DisplayId};

use crate::error::CredentialError;

/// Port for minting and checking device credentials
///
/// Implementations are pure: validation never mutates anything, so a
/// credential can be checked from any connection task concurrently.
pub trait CredentialIssuer: Send + Sync {
    /// Mint a signed credential for a freshly paired display
    fn issue(
        &self,
        display_id: DisplayId,
        device_identifier: &str,
        organization_id: &str,
    ) -> Result<String, CredentialError>;

    /// Verify signature, type and expiry, returning the claims
    fn validate(&self, token: &str) -> Result<DeviceClaims, CredentialError>;
}
