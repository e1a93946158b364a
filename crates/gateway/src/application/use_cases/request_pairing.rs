use std::sync::Arc;
use tracing::info;
use vizora_core::PairingSession;
use vizora_ports::{Clock, DisplayReader, PairingError, PairingStore};

use super::PairingUseCaseError;

/// Longest accepted device identifier
const MAX_DEVICE_IDENTIFIER_LEN: usize = 256;

#[derive(Debug, Clone)]
pub struct RequestPairingCommand {
    pub device_identifier: String,
    pub nickname: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct RequestPairingResult {
    pub session: PairingSession,
    pub expires_in_secs: i64,
    pub pairing_url: String,
}

/// A device asks for a pairing code to show on screen
pub struct RequestPairingUseCase<C, S, D>
where
    C: Clock,
    S: PairingStore,
    D: DisplayReader,
{
    clock: Arc<C>,
    pairing_store: Arc<S>,
    directory: Arc<D>,
    public_url: String,
}

impl<C, S, D> RequestPairingUseCase<C, S, D>
where
    C: Clock,
    S: PairingStore,
    D: DisplayReader,
{
    pub fn new(
        clock: Arc<C>,
        pairing_store: Arc<S>,
        directory: Arc<D>,
        public_url: impl Into<String>,
    ) -> Self {
        Self {
            clock,
            pairing_store,
            directory,
            public_url: public_url.into(),
        }
    }

    pub async fn execute(
        &self,
        command: RequestPairingCommand,
    ) -> Result<RequestPairingResult, PairingUseCaseError> {
        let device_identifier = command.device_identifier.trim();
        if device_identifier.is_empty() {
            return Err(PairingUseCaseError::InvalidRequest(
                "deviceIdentifier is required".to_string(),
            ));
        }
        if device_identifier.len() > MAX_DEVICE_IDENTIFIER_LEN {
            return Err(PairingUseCaseError::InvalidRequest(format!(
                "deviceIdentifier must be at most {} bytes",
                MAX_DEVICE_IDENTIFIER_LEN
            )));
        }

        // A paired device must be unpaired before it can pair again
        if let Some(existing) = self
            .directory
            .find_by_device_identifier(device_identifier)
            .await?
        {
            if existing.is_paired() {
                return Err(PairingError::AlreadyPaired.into());
            }
        }

        let session = self
            .pairing_store
            .create(device_identifier, command.nickname, command.metadata)
            .await?;

        info!(
            code = %session.code,
            device_identifier,
            expires_at = %session.expires_at,
            "Pairing requested"
        );

        let pairing_url = format!(
            "{}/dashboard/devices/pair?code={}",
            self.public_url.trim_end_matches('/'),
            session.code
        );

        Ok(RequestPairingResult {
            expires_in_secs: session.remaining_secs(self.clock.now()),
            pairing_url,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{InMemoryDisplayDirectory, InMemoryPairingStore};
    use chrono::Duration;
    use vizora_clock::ManualClock;
    use vizora_core::PairingStatus;
    use vizora_ports::{DisplayWriter, PairedDisplay};

    fn setup() -> (
        Arc<ManualClock>,
        Arc<InMemoryPairingStore<ManualClock>>,
        Arc<InMemoryDisplayDirectory>,
    ) {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(InMemoryPairingStore::new(
            Arc::clone(&clock),
            Duration::minutes(10),
        ));
        (clock, store, Arc::new(InMemoryDisplayDirectory::new()))
    }

    fn command(device_identifier: &str) -> RequestPairingCommand {
        RequestPairingCommand {
            device_identifier: device_identifier.to_string(),
            nickname: None,
            metadata: serde_json::json!({"hostname": "lobby-pc"}),
        }
    }

    #[tokio::test]
    async fn test_request_creates_pending_session() {
        let (clock, store, directory) = setup();
        let use_case =
            RequestPairingUseCase::new(clock, store, directory, "https://app.example.com/");

        let result = use_case.execute(command("android-1")).await.unwrap();

        assert_eq!(result.session.status, PairingStatus::Pending);
        assert_eq!(result.expires_in_secs, 600);
        assert_eq!(
            result.pairing_url,
            format!(
                "https://app.example.com/dashboard/devices/pair?code={}",
                result.session.code
            )
        );
    }

    #[tokio::test]
    async fn test_blank_identifier_rejected() {
        let (clock, store, directory) = setup();
        let use_case = RequestPairingUseCase::new(clock, store, directory, "http://x");

        assert!(matches!(
            use_case.execute(command("  ")).await,
            Err(PairingUseCaseError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_already_paired_device_rejected() {
        let (clock, store, directory) = setup();
        directory
            .upsert_paired(PairedDisplay {
                id: uuid::Uuid::new_v4(),
                device_identifier: "android-1".into(),
                nickname: "Lobby".into(),
                organization_id: "org-1".into(),
                device_token: "token".into(),
                paired_at: clock.now(),
                location: None,
                metadata: serde_json::Value::Null,
            })
            .await
            .unwrap();
        let use_case = RequestPairingUseCase::new(clock, Arc::clone(&store), directory, "http://x");

        assert_eq!(
            use_case.execute(command("android-1")).await.unwrap_err(),
            PairingUseCaseError::Pairing(PairingError::AlreadyPaired)
        );
        assert!(store.is_empty());
    }
}
