use async_trait::async_trait;
use vizora_core::{PairingClaim, PairingCode, PairingSession, Timestamp};

use crate::error::PairingResult;

/// Storage for pairing sessions keyed by code
///
/// Expiry is lazy: implementations compute `expired` from `expires_at` on
/// every read and claim, so no background sweep is needed for correctness.
#[async_trait]
pub trait PairingStore: Send + Sync {
    /// Create a session under a fresh code unique among live sessions
    async fn create(
        &self,
        device_identifier: &str,
        nickname: Option<String>,
        metadata: serde_json::Value,
    ) -> PairingResult<PairingSession>;

    /// Read a session; `NotFound` for unknown codes
    async fn read(&self, code: &PairingCode) -> PairingResult<PairingSession>;

    /// Atomically move a session from `pending` to `paired`
    ///
    /// Under concurrent claims of one code exactly one call succeeds; the
    /// rest fail with `AlreadyClaimed`.
    async fn claim(&self, code: &PairingCode, claim: PairingClaim)
    -> PairingResult<PairingSession>;

    /// Roll a claim back to `pending` when the display record could not be
    /// written. Only the claiming organization can release.
    async fn release(&self, code: &PairingCode, organization_id: &str) -> PairingResult<()>;

    /// Live pending sessions
    async fn list_pending(&self) -> Vec<PairingSession>;

    /// Drop sessions that expired before `cutoff`; returns how many went
    async fn purge_expired(&self, cutoff: Timestamp) -> usize;
}
