use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use vizora_core::DisplayId;

use crate::application::registry::{ConnectionRegistry, OutboundMessage};

/// Outcome of a push
///
/// Offline devices are not an error: nothing is queued for them, and a
/// device that reconnects asks for its playlist again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Delivered,
    Undeliverable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Display is connected under another organization
    Forbidden,
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::Forbidden => write!(f, "Display belongs to a different organization"),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Hand a message to the device's current connection
pub struct DispatchUseCase {
    registry: Arc<ConnectionRegistry>,
    send_timeout: Duration,
}

impl DispatchUseCase {
    pub fn new(registry: Arc<ConnectionRegistry>, send_timeout: Duration) -> Self {
        Self {
            registry,
            send_timeout,
        }
    }

    pub async fn execute(
        &self,
        display_id: DisplayId,
        organization_id: &str,
        message: OutboundMessage,
    ) -> Result<Delivery, DispatchError> {
        let Some(handle) = self.registry.lookup(display_id) else {
            info!(%display_id, "Display not connected, push undeliverable");
            return Ok(Delivery::Undeliverable);
        };

        if handle.organization_id() != organization_id {
            return Err(DispatchError::Forbidden);
        }

        match handle.send_timeout(message, self.send_timeout).await {
            Ok(()) => Ok(Delivery::Delivered),
            Err(failure) => {
                warn!(%display_id, connection_id = %handle.id(), %failure, "Push not delivered");
                Ok(Delivery::Undeliverable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::ConnectionHandle;
    use chrono::Utc;
    use uuid::Uuid;

    fn push() -> OutboundMessage {
        OutboundMessage::ContentPush {
            content_id: "content-42".into(),
            duration: Some(30),
        }
    }

    #[tokio::test]
    async fn test_push_reaches_only_current_connection() {
        let registry = Arc::new(ConnectionRegistry::new());
        let display = Uuid::new_v4();
        let other_display = Uuid::new_v4();

        let (old, mut old_rx) = ConnectionHandle::new("org-1", 8);
        registry.register(display, old, Utc::now());
        let (current, mut current_rx) = ConnectionHandle::new("org-1", 8);
        registry.register(display, current, Utc::now());
        let (other, mut other_rx) = ConnectionHandle::new("org-1", 8);
        registry.register(other_display, other, Utc::now());

        let dispatch = DispatchUseCase::new(Arc::clone(&registry), Duration::from_secs(2));
        let delivery = dispatch.execute(display, "org-1", push()).await.unwrap();

        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(current_rx.try_recv().unwrap(), push());
        assert!(current_rx.try_recv().is_err());
        assert!(other_rx.try_recv().is_err());
        // The superseded connection's channel is closed, not fed
        assert!(old_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_push_to_absent_display_is_undeliverable() {
        let dispatch =
            DispatchUseCase::new(Arc::new(ConnectionRegistry::new()), Duration::from_secs(2));
        assert_eq!(
            dispatch.execute(Uuid::new_v4(), "org-1", push()).await,
            Ok(Delivery::Undeliverable)
        );
    }

    #[tokio::test]
    async fn test_push_across_organizations_forbidden() {
        let registry = Arc::new(ConnectionRegistry::new());
        let display = Uuid::new_v4();
        let (handle, mut rx) = ConnectionHandle::new("org-1", 8);
        registry.register(display, handle, Utc::now());

        let dispatch = DispatchUseCase::new(registry, Duration::from_secs(2));
        assert_eq!(
            dispatch.execute(display, "org-2", push()).await,
            Err(DispatchError::Forbidden)
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_connection_is_undeliverable() {
        let registry = Arc::new(ConnectionRegistry::new());
        let display = Uuid::new_v4();
        let (handle, rx) = ConnectionHandle::new("org-1", 8);
        registry.register(display, handle, Utc::now());
        drop(rx);

        let dispatch = DispatchUseCase::new(registry, Duration::from_millis(50));
        assert_eq!(
            dispatch.execute(display, "org-1", push()).await,
            Ok(Delivery::Undeliverable)
        );
    }
}
