use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info, warn};
use vizora_core::{
    ConnectionId, ConnectionStatus, DashboardEvent, DeviceMetrics, DisplayId, DisplayStatusUpdate,
    HeartbeatUpdate, Timestamp,
};
use vizora_ports::Clock;

use super::AuthenticatedDevice;
use crate::application::ports::{EventPublisher, StatusSink};
use crate::application::registry::{
    ConnectionHandle, ConnectionRegistry, ExpiredConnection, TouchOutcome,
};

/// Heartbeat payload as reported by a device
#[derive(Debug, Clone, Default)]
pub struct HeartbeatReport {
    /// Device clock at send time; receive time is used when absent
    pub timestamp: Option<Timestamp>,
    pub status: Option<ConnectionStatus>,
    pub metrics: Option<DeviceMetrics>,
    pub content_id: Option<String>,
}

/// Liveness lifecycle of device connections
///
/// Connect, heartbeat, disconnect and the timeout sweep all go through the
/// registry; every status transition is written through to the directory and
/// broadcast to the organization, while plain heartbeats are only staged.
pub struct DevicePresenceUseCase<C, S, E>
where
    C: Clock,
    S: StatusSink,
    E: EventPublisher,
{
    clock: Arc<C>,
    registry: Arc<ConnectionRegistry>,
    status_sink: Arc<S>,
    event_publisher: Arc<E>,
}

impl<C, S, E> Clone for DevicePresenceUseCase<C, S, E>
where
    C: Clock,
    S: StatusSink,
    E: EventPublisher,
{
    fn clone(&self) -> Self {
        Self {
            clock: Arc::clone(&self.clock),
            registry: Arc::clone(&self.registry),
            status_sink: Arc::clone(&self.status_sink),
            event_publisher: Arc::clone(&self.event_publisher),
        }
    }
}

impl<C, S, E> DevicePresenceUseCase<C, S, E>
where
    C: Clock,
    S: StatusSink,
    E: EventPublisher,
{
    pub fn new(
        clock: Arc<C>,
        registry: Arc<ConnectionRegistry>,
        status_sink: Arc<S>,
        event_publisher: Arc<E>,
    ) -> Self {
        Self {
            clock,
            registry,
            status_sink,
            event_publisher,
        }
    }

    /// Register an authenticated connection; returns whether it replaced
    /// an older one
    pub fn connect(&self, device: &AuthenticatedDevice, handle: ConnectionHandle) -> bool {
        let now = self.clock.now();
        let connection_id = handle.id();
        let evicted = self.registry.register(device.display_id, handle, now);

        if let Some(previous) = &evicted {
            info!(
                display_id = %device.display_id,
                previous = %previous.id(),
                current = %connection_id,
                "Device reconnected, superseding previous connection"
            );
        } else {
            info!(
                display_id = %device.display_id,
                organization_id = %device.organization_id,
                %connection_id,
                "Device connected"
            );
        }

        self.transition(
            device.display_id,
            &device.organization_id,
            ConnectionStatus::Online,
            Some(now),
            now,
        );
        evicted.is_some()
    }

    /// Apply a heartbeat from `connection_id`
    pub fn heartbeat(
        &self,
        display_id: DisplayId,
        organization_id: &str,
        connection_id: ConnectionId,
        report: HeartbeatReport,
    ) -> TouchOutcome {
        let now = self.clock.now();
        // A device talking to us is not offline, whatever it claims
        let status = report
            .status
            .filter(ConnectionStatus::is_connected)
            .unwrap_or(ConnectionStatus::Online);

        let outcome = self.registry.touch_heartbeat(
            display_id,
            connection_id,
            HeartbeatUpdate {
                received_at: now,
                reported_at: report.timestamp.unwrap_or(now),
                status,
                metrics: report.metrics.clone(),
                content_id: report.content_id.clone(),
            },
        );

        match outcome {
            TouchOutcome::Applied { previous } => {
                let update = DisplayStatusUpdate {
                    display_id,
                    status,
                    last_heartbeat_at: Some(now),
                    metrics: report.metrics,
                    current_content_id: report.content_id,
                    observed_at: now,
                };
                if previous != status {
                    debug!(%display_id, from = previous.as_str(), to = status.as_str(), "Device status changed");
                    self.status_sink.write_through(update);
                    self.broadcast(display_id, organization_id, status, now);
                } else {
                    self.status_sink.enqueue(update);
                }
            }
            TouchOutcome::Stale => {
                debug!(%display_id, "Ignoring out-of-order heartbeat");
            }
            TouchOutcome::Superseded | TouchOutcome::Unknown => {
                debug!(%display_id, %connection_id, "Heartbeat from unregistered connection");
            }
        }
        outcome
    }

    /// Transport closed; only the connection that still owns the entry
    /// reports the device offline
    pub fn disconnect(
        &self,
        display_id: DisplayId,
        organization_id: &str,
        connection_id: ConnectionId,
    ) -> bool {
        if !self.registry.unregister(display_id, connection_id) {
            debug!(%display_id, %connection_id, "Superseded connection closed");
            return false;
        }

        let now = self.clock.now();
        info!(%display_id, %connection_id, "Device disconnected");
        self.transition(
            display_id,
            organization_id,
            ConnectionStatus::Offline,
            None,
            now,
        );
        true
    }

    /// Take devices silent for longer than `timeout` offline
    pub fn sweep(&self, timeout: Duration) -> Vec<ExpiredConnection> {
        let now = self.clock.now();
        let expired = self.registry.sweep_expired(now, timeout);

        for connection in &expired {
            warn!(
                display_id = %connection.display_id,
                last_heartbeat_at = %connection.last_heartbeat_at,
                "Heartbeat timeout, marking device offline"
            );
            self.transition(
                connection.display_id,
                &connection.organization_id,
                ConnectionStatus::Offline,
                Some(connection.last_heartbeat_at),
                now,
            );
        }
        expired
    }

    fn transition(
        &self,
        display_id: DisplayId,
        organization_id: &str,
        status: ConnectionStatus,
        last_heartbeat_at: Option<Timestamp>,
        now: Timestamp,
    ) {
        self.status_sink.write_through(DisplayStatusUpdate {
            display_id,
            status,
            last_heartbeat_at,
            metrics: None,
            current_content_id: None,
            observed_at: now,
        });
        self.broadcast(display_id, organization_id, status, now);
    }

    fn broadcast(
        &self,
        display_id: DisplayId,
        organization_id: &str,
        status: ConnectionStatus,
        now: Timestamp,
    ) {
        self.event_publisher.publish(DashboardEvent::DeviceStatus {
            display_id,
            organization_id: organization_id.to_string(),
            status,
            timestamp: now,
        });
    }
}
