mod connection;
mod credential;
mod display;
mod pairing_session;

pub use connection::{ConnectionStatus, DeviceConnection, DeviceMetrics, HeartbeatUpdate};
pub use credential::{CredentialType, DeviceClaims};
pub use display::{Display, DisplayStatusUpdate, PlaybackReport, Playlist, PlaylistItem};
pub use pairing_session::{
    InvalidPairingCode, PairingClaim, PairingCode, PairingSession, PairingStatus,
};
