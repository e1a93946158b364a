use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use vizora_core::PairingCode;
use vizora_ports::Clock;

use crate::application::Topic;
use crate::presentation::rest::{ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerQuery {
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub pairing_code: Option<String>,
}

impl ListenerQuery {
    fn topics(self) -> Result<Vec<Topic>, ApiError> {
        let mut topics = Vec::new();
        if let Some(org) = self.organization_id.filter(|o| !o.trim().is_empty()) {
            topics.push(Topic::Organization(org));
        }
        if let Some(code) = self.pairing_code {
            let code = PairingCode::parse(&code)
                .map_err(|e| ApiError::invalid_parameter("pairingCode", &e.to_string()))?;
            topics.push(Topic::Pairing(code.to_string()));
        }
        if topics.is_empty() {
            return Err(ApiError::bad_request(
                "INVALID_REQUEST",
                "organizationId or pairingCode is required",
            ));
        }
        Ok(topics)
    }
}

/// GET /ws/events
pub async fn listener_ws_handler<C: Clock + 'static>(
    ws: WebSocketUpgrade,
    Query(query): Query<ListenerQuery>,
    State(state): State<Arc<AppState<C>>>,
) -> Response {
    match query.topics() {
        Ok(topics) => ws.on_upgrade(move |socket| handle_listener_socket(socket, state, topics)),
        Err(e) => e.into_response(),
    }
}

/// Forward dashboard events for `topics` until the client goes away
async fn handle_listener_socket<C: Clock + 'static>(
    socket: WebSocket,
    state: Arc<AppState<C>>,
    topics: Vec<Topic>,
) {
    let (mut sender, mut receiver) = socket.split();

    // Channel for outgoing messages
    let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(100);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let mut forwarders = Vec::with_capacity(topics.len());
    for topic in &topics {
        let mut event_rx = state.event_publisher.subscribe(topic.clone());
        let tx = tx.clone();
        let topic_name = topic.to_string();

        forwarders.push(tokio::spawn(async move {
            loop {
                match event_rx.recv().await {
                    Ok(event) => {
                        let Ok(json) = serde_json::to_string(&event) else {
                            continue;
                        };
                        if tx.send(json).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(topic = %topic_name, skipped, "Dashboard listener lagging, events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
    }
    drop(tx);
    debug!(topics = topics.len(), "Dashboard listener subscribed");

    // Listeners only receive; inbound frames are ignored
    while let Some(Ok(msg)) = receiver.next().await {
        if matches!(msg, Message::Close(_)) {
            break;
        }
    }

    // Cleanup
    for forwarder in forwarders {
        forwarder.abort();
    }
    for _ in &topics {
        state.event_publisher.unsubscribe();
    }
    let _ = send_task.await;
    debug!("Dashboard listener disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topics_from_query() {
        let query = ListenerQuery {
            organization_id: Some("org-1".into()),
            pairing_code: Some("ab23cd".into()),
        };
        assert_eq!(
            query.topics().unwrap(),
            vec![
                Topic::Organization("org-1".into()),
                Topic::Pairing("AB23CD".into())
            ]
        );
    }

    #[test]
    fn test_topics_required() {
        assert!(ListenerQuery::default().topics().is_err());
        let bad_code = ListenerQuery {
            organization_id: None,
            pairing_code: Some("??".into()),
        };
        assert!(bad_code.topics().is_err());
    }
}
