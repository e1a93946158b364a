use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Timestamp in UTC
pub type Timestamp = DateTime<Utc>;

/// Identifier of a paired display; also the `sub` of its device credential
pub type DisplayId = Uuid;

/// Identifier of a realtime connection, unique per accepted socket
pub type ConnectionId = Uuid;

/// Owning organization identifier (organizations live outside the gateway)
pub type OrganizationId = String;
