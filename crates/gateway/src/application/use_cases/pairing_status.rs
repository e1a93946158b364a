use std::sync::Arc;
use vizora_core::{DisplayId, OrganizationId, PairingCode, PairingStatus, Timestamp};
use vizora_ports::{Clock, PairingStore};

use super::PairingUseCaseError;

/// What a polling device learns about its session
#[derive(Debug, Clone, PartialEq)]
pub struct PairingStatusView {
    pub status: PairingStatus,
    pub device_token: Option<String>,
    pub display_id: Option<DisplayId>,
    pub organization_id: Option<OrganizationId>,
    pub expires_at: Timestamp,
}

/// Device-side status poll; a pure read
pub struct PollPairingStatusUseCase<C: Clock, S: PairingStore> {
    clock: Arc<C>,
    pairing_store: Arc<S>,
}

impl<C: Clock, S: PairingStore> PollPairingStatusUseCase<C, S> {
    pub fn new(clock: Arc<C>, pairing_store: Arc<S>) -> Self {
        Self {
            clock,
            pairing_store,
        }
    }

    pub async fn execute(&self, code: &PairingCode) -> Result<PairingStatusView, PairingUseCaseError> {
        let session = self.pairing_store.read(code).await?;
        let status = session.status_at(self.clock.now());

        // Only a live paired session hands out its credential
        let view = match status {
            PairingStatus::Paired => PairingStatusView {
                status,
                device_token: session.issued_device_token,
                display_id: session.display_id,
                organization_id: session.claimed_by_organization_id,
                expires_at: session.expires_at,
            },
            PairingStatus::Pending | PairingStatus::Expired => PairingStatusView {
                status,
                device_token: None,
                display_id: None,
                organization_id: None,
                expires_at: session.expires_at,
            },
        };
        Ok(view)
    }
}
