use std::sync::Arc;
use vizora_core::{PairingCode, Timestamp};
use vizora_ports::PairingStore;

/// Pending code as shown to dashboard users; carries no device identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ActivePairing {
    pub code: PairingCode,
    pub nickname: String,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

pub struct ListActivePairingsUseCase<S: PairingStore> {
    pairing_store: Arc<S>,
}

impl<S: PairingStore> ListActivePairingsUseCase<S> {
    pub fn new(pairing_store: Arc<S>) -> Self {
        Self { pairing_store }
    }

    pub async fn execute(&self) -> Vec<ActivePairing> {
        self.pairing_store
            .list_pending()
            .await
            .into_iter()
            .map(|session| ActivePairing {
                code: session.code,
                nickname: session.nickname,
                created_at: session.created_at,
                expires_at: session.expires_at,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryPairingStore;
    use chrono::Duration;
    use vizora_clock::ManualClock;

    #[tokio::test]
    async fn test_lists_pending_in_creation_order() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(InMemoryPairingStore::new(
            Arc::clone(&clock),
            Duration::minutes(10),
        ));
        let first = store
            .create("a", Some("Lobby".into()), serde_json::Value::Null)
            .await
            .unwrap();
        clock.advance(Duration::seconds(5));
        let second = store
            .create("b", None, serde_json::Value::Null)
            .await
            .unwrap();

        let listed = ListActivePairingsUseCase::new(store).execute().await;
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].code, first.code);
        assert_eq!(listed[0].nickname, "Lobby");
        assert_eq!(listed[1].code, second.code);
    }
}
