//! In-memory registry of live device connections
//!
//! At most one connection is registered per display. The registry owns the
//! only sender of each connection's outbound channel, so evicting or sweeping
//! an entry closes that channel and the connection loop shuts its socket.

use chrono::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::SendTimeoutError;
use uuid::Uuid;
use vizora_core::{
    ConnectionId, ConnectionStatus, DeviceConnection, DeviceMetrics, DisplayId, HeartbeatUpdate,
    OrganizationId, Playlist, Timestamp,
};

/// Message pushed from the gateway to a connected device
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    ContentPush {
        content_id: String,
        duration: Option<u32>,
    },
    PlaylistPush(Playlist),
    Command {
        command: String,
        args: serde_json::Value,
    },
}

/// Why a message could not be handed to a connection
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFailure {
    #[error("connection outbound buffer stayed full")]
    Timeout,

    #[error("connection is closed")]
    Closed,
}

/// Sending half of one device connection
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    organization_id: OrganizationId,
    sender: mpsc::Sender<OutboundMessage>,
}

impl ConnectionHandle {
    /// Create a handle and the receiver the connection loop drains
    pub fn new(
        organization_id: impl Into<OrganizationId>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<OutboundMessage>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handle = Self {
            id: Uuid::new_v4(),
            organization_id: organization_id.into(),
            sender,
        };
        (handle, receiver)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue a message, waiting at most `timeout` for buffer space
    pub async fn send_timeout(
        &self,
        message: OutboundMessage,
        timeout: std::time::Duration,
    ) -> Result<(), DeliveryFailure> {
        self.sender
            .send_timeout(message, timeout)
            .await
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => DeliveryFailure::Timeout,
                SendTimeoutError::Closed(_) => DeliveryFailure::Closed,
            })
    }
}

/// Result of applying a heartbeat to the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchOutcome {
    /// Heartbeat recorded; carries the status held before it
    Applied { previous: ConnectionStatus },
    /// Device-reported time is older than one already applied
    Stale,
    /// Another connection has since registered for this display
    Superseded,
    /// Display has no live connection
    Unknown,
}

/// Connection removed by a liveness sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredConnection {
    pub display_id: DisplayId,
    pub connection_id: ConnectionId,
    pub organization_id: OrganizationId,
    pub last_heartbeat_at: Timestamp,
}

struct Entry {
    handle: ConnectionHandle,
    status: ConnectionStatus,
    connected_at: Timestamp,
    last_heartbeat_at: Timestamp,
    last_reported_at: Option<Timestamp>,
    metrics: DeviceMetrics,
    current_content_id: Option<String>,
}

impl Entry {
    fn snapshot(&self, display_id: DisplayId) -> DeviceConnection {
        DeviceConnection {
            display_id,
            connection_id: self.handle.id,
            organization_id: self.handle.organization_id.clone(),
            status: self.status,
            connected_at: self.connected_at,
            last_heartbeat_at: self.last_heartbeat_at,
            last_reported_at: self.last_reported_at,
            metrics: self.metrics.clone(),
            current_content_id: self.current_content_id.clone(),
        }
    }
}

/// Registry of live device connections keyed by display id
///
/// All operations are linearizable per display: a single lock guards the
/// map and is never held across an await point.
#[derive(Default)]
pub struct ConnectionRegistry {
    entries: Mutex<HashMap<DisplayId, Entry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection, returning the one it replaced
    ///
    /// The replaced handle is the caller's to log; once it is dropped the
    /// old connection's outbound channel closes.
    pub fn register(
        &self,
        display_id: DisplayId,
        handle: ConnectionHandle,
        now: Timestamp,
    ) -> Option<ConnectionHandle> {
        let entry = Entry {
            handle,
            status: ConnectionStatus::Online,
            connected_at: now,
            last_heartbeat_at: now,
            last_reported_at: None,
            metrics: DeviceMetrics::default(),
            current_content_id: None,
        };
        self.entries
            .lock()
            .insert(display_id, entry)
            .map(|previous| previous.handle)
    }

    /// Live connection for a display
    pub fn lookup(&self, display_id: DisplayId) -> Option<ConnectionHandle> {
        self.entries
            .lock()
            .get(&display_id)
            .map(|entry| entry.handle.clone())
    }

    /// Apply a heartbeat from `connection_id`
    ///
    /// Ordering uses the device-reported time; liveness uses the
    /// server-side receive time.
    pub fn touch_heartbeat(
        &self,
        display_id: DisplayId,
        connection_id: ConnectionId,
        update: HeartbeatUpdate,
    ) -> TouchOutcome {
        let mut entries = self.entries.lock();
        let Some(entry) = entries.get_mut(&display_id) else {
            return TouchOutcome::Unknown;
        };
        if entry.handle.id != connection_id {
            return TouchOutcome::Superseded;
        }
        if entry
            .last_reported_at
            .is_some_and(|last| update.reported_at < last)
        {
            return TouchOutcome::Stale;
        }

        let previous = entry.status;
        entry.status = update.status;
        entry.last_reported_at = Some(update.reported_at);
        entry.last_heartbeat_at = entry.last_heartbeat_at.max(update.received_at);
        if let Some(metrics) = update.metrics {
            entry.metrics = metrics;
        }
        if update.content_id.is_some() {
            entry.current_content_id = update.content_id;
        }
        TouchOutcome::Applied { previous }
    }

    /// Remove every connection silent for longer than `timeout`
    pub fn sweep_expired(&self, now: Timestamp, timeout: Duration) -> Vec<ExpiredConnection> {
        let mut expired = Vec::new();
        self.entries.lock().retain(|display_id, entry| {
            if now - entry.last_heartbeat_at > timeout {
                expired.push(ExpiredConnection {
                    display_id: *display_id,
                    connection_id: entry.handle.id,
                    organization_id: entry.handle.organization_id.clone(),
                    last_heartbeat_at: entry.last_heartbeat_at,
                });
                false
            } else {
                true
            }
        });
        expired
    }

    /// Remove the entry only if `connection_id` still owns it
    pub fn unregister(&self, display_id: DisplayId, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(&display_id) {
            Some(entry) if entry.handle.id == connection_id => {
                entries.remove(&display_id);
                true
            }
            _ => false,
        }
    }

    pub fn snapshot(&self, display_id: DisplayId) -> Option<DeviceConnection> {
        self.entries
            .lock()
            .get(&display_id)
            .map(|entry| entry.snapshot(display_id))
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
