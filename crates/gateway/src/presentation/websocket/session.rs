//! Per-connection device protocol state
//!
//! Socket I/O lives in the handler; this type turns inbound frames into
//! replies so the protocol can be driven without a socket.

use std::sync::Arc;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use vizora_core::ConnectionId;
use vizora_ports::Clock;

use super::message::{DeviceEvent, DeviceRequest};
use crate::application::{AuthError, AuthenticatedDevice, MessageRateLimiter, TouchOutcome};
use crate::presentation::rest::AppState;

/// What the connection loop should do after a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    None,
    Send(DeviceEvent),
    /// Send the event, then close the socket
    Close(DeviceEvent),
}

pub struct DeviceSession<C: Clock + 'static> {
    state: Arc<AppState<C>>,
    device: AuthenticatedDevice,
    token: String,
    connection_id: ConnectionId,
}

impl<C: Clock + 'static> DeviceSession<C> {
    pub fn new(
        state: Arc<AppState<C>>,
        device: AuthenticatedDevice,
        token: String,
        connection_id: ConnectionId,
    ) -> Self {
        Self {
            state,
            device,
            token,
            connection_id,
        }
    }

    pub fn device(&self) -> &AuthenticatedDevice {
        &self.device
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Key used for per-connection message limits
    pub fn rate_limit_key(&self) -> String {
        self.connection_id.to_string()
    }

    /// Frame sent right after the handshake
    pub fn config_event(&self) -> DeviceEvent {
        let config = &self.state.config;
        DeviceEvent::Config {
            heartbeat_interval_ms: config.heartbeat.interval_ms,
            missed_heartbeat_limit: config.heartbeat.missed_limit,
            cache_size_bytes: config.player.cache_size_bytes,
            auto_update: config.player.auto_update,
            display_id: self.device.display_id,
            server_time: self.state.clock.now_millis(),
        }
    }

    pub async fn on_text(&mut self, text: &str) -> Reply {
        let limit = self.state.rate_limiter.check_message(&self.rate_limit_key());
        if !limit.allowed {
            debug!(connection_id = %self.connection_id, "Device message rate limited");
            return Reply::Send(DeviceEvent::error(None, "RATE_LIMITED", "Too many messages"));
        }

        let request = match DeviceRequest::parse(text) {
            Ok(request) => request,
            Err(e) => {
                debug!(connection_id = %self.connection_id, error = %e, "Unparseable device frame");
                return Reply::Send(DeviceEvent::error(
                    None,
                    "INVALID_MESSAGE",
                    format!("Invalid message: {}", e),
                ));
            }
        };

        match &request {
            DeviceRequest::Heartbeat { .. } => self.on_heartbeat(&request).await,
            DeviceRequest::Impression { .. } | DeviceRequest::ContentError { .. } => {
                if let Some(report) = request.playback_report(self.state.clock.now()) {
                    self.state
                        .playback()
                        .record(self.device.display_id, report)
                        .await;
                }
                Reply::None
            }
            DeviceRequest::PlaylistRequest { id } => {
                match self
                    .state
                    .playback()
                    .current_playlist(self.device.display_id)
                    .await
                {
                    Ok(playlist) => Reply::Send(DeviceEvent::PlaylistState {
                        id: id.clone(),
                        playlist,
                    }),
                    Err(e) => Reply::Send(DeviceEvent::error(
                        id.as_deref(),
                        "DIRECTORY_UNAVAILABLE",
                        e.to_string(),
                    )),
                }
            }
        }
    }

    async fn on_heartbeat(&mut self, request: &DeviceRequest) -> Reply {
        if let Some(reply) = self.revalidate().await {
            return reply;
        }

        let Some(report) = request.heartbeat_report() else {
            return Reply::None;
        };

        let outcome = self.state.presence().heartbeat(
            self.device.display_id,
            &self.device.organization_id,
            self.connection_id,
            report,
        );

        match outcome {
            TouchOutcome::Applied { .. } | TouchOutcome::Stale => Reply::Send(DeviceEvent::Ack {
                id: request.id().map(str::to_string),
                success: true,
                next_heartbeat_in_ms: self.state.config.heartbeat.interval_ms,
                timestamp: self.state.clock.now_millis(),
            }),
            TouchOutcome::Superseded | TouchOutcome::Unknown => Reply::Close(DeviceEvent::error(
                request.id(),
                "CONNECTION_SUPERSEDED",
                "Connection is no longer registered",
            )),
        }
    }

    /// Re-check the credential against the directory before a heartbeat is
    /// applied, so an unpaired display is dropped without reconnecting
    async fn revalidate(&self) -> Option<Reply> {
        let limit = self.state.config.heartbeat.revalidate_timeout();
        let result = match timeout(limit, self.state.authenticator().execute(Some(&self.token))).await
        {
            Ok(result) => result,
            Err(_) => Err(AuthError::DirectoryUnavailable(format!(
                "no answer within {}ms",
                limit.as_millis()
            ))),
        };

        match result {
            Ok(_) => None,
            Err(e) if e.is_revocation() => {
                info!(display_id = %self.device.display_id, code = e.code(), "Device credential revoked");
                Some(Reply::Close(DeviceEvent::auth_error(e.code(), e.to_string())))
            }
            Err(e) => {
                warn!(display_id = %self.device.display_id, error = %e, "Could not revalidate device credential");
                None
            }
        }
    }
}
