use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use vizora_core::{DashboardEvent, Display, PairingClaim, PairingCode, PairingStatus};
use vizora_ports::{
    Clock, CredentialIssuer, DisplayDirectory, PairedDisplay, PairingError, PairingStore,
};

use super::PairingUseCaseError;
use crate::application::ports::{EventPublisher, Topic};

#[derive(Debug, Clone)]
pub struct CompletePairingCommand {
    pub code: PairingCode,
    pub organization_id: String,
    pub user_id: Option<String>,
    pub nickname: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CompletePairingResult {
    pub display: Display,
    pub device_token: String,
}

/// A dashboard user claims a pending code for their organization
///
/// The credential is minted first and written onto the session by the
/// claim itself, so no reader ever sees `paired` without a token. If the
/// display record cannot be written afterwards, the claim is released.
pub struct CompletePairingUseCase<C, S, D, I, E>
where
    C: Clock,
    S: PairingStore,
    D: DisplayDirectory,
    I: CredentialIssuer,
    E: EventPublisher,
{
    clock: Arc<C>,
    pairing_store: Arc<S>,
    directory: Arc<D>,
    issuer: Arc<I>,
    event_publisher: Arc<E>,
}

impl<C, S, D, I, E> CompletePairingUseCase<C, S, D, I, E>
where
    C: Clock,
    S: PairingStore,
    D: DisplayDirectory,
    I: CredentialIssuer,
    E: EventPublisher,
{
    pub fn new(
        clock: Arc<C>,
        pairing_store: Arc<S>,
        directory: Arc<D>,
        issuer: Arc<I>,
        event_publisher: Arc<E>,
    ) -> Self {
        Self {
            clock,
            pairing_store,
            directory,
            issuer,
            event_publisher,
        }
    }

    pub async fn execute(
        &self,
        command: CompletePairingCommand,
    ) -> Result<CompletePairingResult, PairingUseCaseError> {
        let organization_id = command.organization_id;
        if organization_id.trim().is_empty() {
            return Err(PairingUseCaseError::InvalidRequest(
                "organization id is required".to_string(),
            ));
        }

        // Surface NotFound / Expired / AlreadyClaimed before minting anything
        let session = self.pairing_store.read(&command.code).await?;
        match session.status_at(self.clock.now()) {
            PairingStatus::Pending => {}
            PairingStatus::Paired => return Err(PairingError::AlreadyClaimed.into()),
            PairingStatus::Expired => return Err(PairingError::Expired.into()),
        }

        // Re-pairing a known device keeps its display id
        let display_id = self
            .directory
            .find_by_device_identifier(&session.device_identifier)
            .await?
            .map(|display| display.id)
            .unwrap_or_else(Uuid::new_v4);

        let device_token =
            self.issuer
                .issue(display_id, &session.device_identifier, &organization_id)?;

        let claimed = self
            .pairing_store
            .claim(
                &command.code,
                PairingClaim {
                    organization_id: organization_id.clone(),
                    display_id,
                    device_token: device_token.clone(),
                    nickname: command.nickname,
                },
            )
            .await?;

        let paired_at = self.clock.now();
        let location = claimed
            .metadata
            .get("hostname")
            .and_then(|h| h.as_str())
            .map(str::to_string);

        let display = match self
            .directory
            .upsert_paired(PairedDisplay {
                id: display_id,
                device_identifier: claimed.device_identifier.clone(),
                nickname: claimed.nickname.clone(),
                organization_id: organization_id.clone(),
                device_token: device_token.clone(),
                paired_at,
                location,
                metadata: claimed.metadata.clone(),
            })
            .await
        {
            Ok(display) => display,
            Err(e) => {
                warn!(code = %command.code, error = %e, "Display write failed, releasing claim");
                if let Err(release_error) = self
                    .pairing_store
                    .release(&command.code, &organization_id)
                    .await
                {
                    error!(code = %command.code, error = %release_error, "Failed to release claim");
                }
                return Err(e.into());
            }
        };

        info!(
            code = %command.code,
            %display_id,
            organization_id = %organization_id,
            user_id = ?command.user_id,
            "Display paired"
        );

        let event = DashboardEvent::DisplayPaired {
            code: command.code.to_string(),
            display_id,
            organization_id,
            nickname: display.nickname.clone(),
            timestamp: paired_at,
        };
        self.event_publisher
            .publish_to(&Topic::Pairing(command.code.to_string()), event.clone());
        self.event_publisher.publish(event);

        Ok(CompletePairingResult {
            display,
            device_token,
        })
    }
}
