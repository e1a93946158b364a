//! Vizora Core Domain
//!
//! Pure domain types for display pairing and the realtime device gateway.
//! This crate contains no async, no I/O, and is 100% unit testable.

pub mod entities;
pub mod events;
pub mod values;

// Re-export commonly used types at crate root
pub use entities::{
    // Realtime connections
    ConnectionStatus,
    CredentialType,
    // Credentials
    DeviceClaims,
    DeviceConnection,
    DeviceMetrics,
    // External display records
    Display,
    DisplayStatusUpdate,
    HeartbeatUpdate,
    InvalidPairingCode,
    // Pairing
    PairingClaim,
    PairingCode,
    PairingSession,
    PairingStatus,
    PlaybackReport,
    Playlist,
    PlaylistItem,
};
pub use events::DashboardEvent;
pub use values::{ConnectionId, DisplayId, OrganizationId, Timestamp};
