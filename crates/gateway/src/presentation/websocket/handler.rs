use axum::{
    extract::{
        ConnectInfo, Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::{HeaderMap, header::AUTHORIZATION},
    response::Response,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vizora_ports::Clock;

use super::message::DeviceEvent;
use super::session::{DeviceSession, Reply};
use crate::application::{ConnectionHandle, ConnectionRateLimiter, MessageRateLimiter};
use crate::presentation::rest::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct DeviceConnectQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Credential from `?token=` or an `Authorization: Bearer` header
fn credential(query: DeviceConnectQuery, headers: &HeaderMap) -> Option<String> {
    query.token.filter(|t| !t.trim().is_empty()).or_else(|| {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

/// GET /ws/device
pub async fn device_ws_handler<C: Clock + 'static>(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<DeviceConnectQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState<C>>>,
) -> Response {
    let limit = state.rate_limiter.check_connection(&addr.ip().to_string());
    if !limit.allowed {
        warn!(client_ip = %addr.ip(), "Device connection rate limited");
        let message = match limit.retry_after {
            Some(wait) => format!("Too many connection attempts; retry after {}ms", wait.as_millis()),
            None => "Too many connection attempts".to_string(),
        };
        return ws.on_upgrade(move |socket| reject(socket, "RATE_LIMITED", message));
    }

    let token = credential(query, &headers);
    ws.on_upgrade(move |socket| handle_device_socket(socket, state, token))
}

/// Report why the connection is refused, then close it
async fn reject(socket: WebSocket, code: &'static str, message: String) {
    let (mut sink, _stream) = socket.split();
    send_event(&mut sink, &DeviceEvent::auth_error(code, message)).await;
    close(&mut sink, close_code::POLICY, code).await;
}

type Sink = SplitSink<WebSocket, Message>;

async fn send_event(sink: &mut Sink, event: &DeviceEvent) -> bool {
    sink.send(Message::Text(event.to_json().into())).await.is_ok()
}

async fn close(sink: &mut Sink, code: u16, reason: &str) {
    let _ = sink
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.to_string().into(),
        })))
        .await;
}

/// Handle one device connection from handshake to disconnect
async fn handle_device_socket<C: Clock + 'static>(
    socket: WebSocket,
    state: Arc<AppState<C>>,
    token: Option<String>,
) {
    let (mut sink, mut stream) = socket.split();

    let device = match state.authenticator().execute(token.as_deref()).await {
        Ok(device) => device,
        Err(e) => {
            warn!(code = e.code(), error = %e, "Device authentication failed");
            send_event(&mut sink, &DeviceEvent::auth_error(e.code(), e.to_string())).await;
            close(&mut sink, close_code::POLICY, e.code()).await;
            return;
        }
    };
    // Authentication only succeeds with a token
    let token = token.unwrap_or_default();

    let (handle, mut outbound_rx) = ConnectionHandle::new(
        device.organization_id.clone(),
        state.config.dispatch.outbound_buffer,
    );
    let connection_id = handle.id();
    let presence = state.presence();
    presence.connect(&device, handle);

    let mut session = DeviceSession::new(Arc::clone(&state), device, token, connection_id);
    let display_id = session.device().display_id;

    if send_event(&mut sink, &session.config_event()).await {
        loop {
            tokio::select! {
                outbound = outbound_rx.recv() => match outbound {
                    Some(message) => {
                        if !send_event(&mut sink, &DeviceEvent::from(message)).await {
                            break;
                        }
                    }
                    None => {
                        // Registry dropped our sender: superseded or timed out
                        info!(%display_id, %connection_id, "Closing connection released by gateway");
                        close(&mut sink, close_code::NORMAL, "connection replaced or expired").await;
                        break;
                    }
                },
                inbound = stream.next() => match inbound {
                    Some(Ok(Message::Text(text))) => match session.on_text(text.as_str()).await {
                        Reply::None => {}
                        Reply::Send(event) => {
                            if !send_event(&mut sink, &event).await {
                                break;
                            }
                        }
                        Reply::Close(event) => {
                            send_event(&mut sink, &event).await;
                            close(&mut sink, close_code::POLICY, "closed by gateway").await;
                            break;
                        }
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(%display_id, error = %e, "Device socket error");
                        break;
                    }
                },
            }
        }
    }

    let device = session.device();
    presence.disconnect(display_id, &device.organization_id, connection_id);
    state.rate_limiter.forget(&session.rate_limit_key());
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_query_token_preferred() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        let query = DeviceConnectQuery {
            token: Some("from-query".into()),
        };
        assert_eq!(credential(query, &headers).as_deref(), Some("from-query"));
        assert_eq!(
            credential(DeviceConnectQuery::default(), &headers).as_deref(),
            Some("from-header")
        );
    }

    #[test]
    fn test_missing_credential() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        let query = DeviceConnectQuery {
            token: Some("  ".into()),
        };
        assert_eq!(credential(query, &headers), None);
    }
}
