//! Port for the external display directory
//!
//! Display records, playlists and playback analytics are owned by services
//! outside the gateway. Follows Interface Segregation Principle with focused
//! read and write traits.

use async_trait::async_trait;
use vizora_core::{
    Display, DisplayId, DisplayStatusUpdate, PlaybackReport, Playlist, Timestamp,
};

use crate::error::DirectoryResult;

/// Attributes written when a pairing completes
#[derive(Debug, Clone)]
pub struct PairedDisplay {
    pub id: DisplayId,
    pub device_identifier: String,
    pub nickname: String,
    pub organization_id: String,
    pub device_token: String,
    pub paired_at: Timestamp,
    pub location: Option<String>,
    pub metadata: serde_json::Value,
}

/// Read operations against the display directory
#[async_trait]
pub trait DisplayReader: Send + Sync {
    /// Get a display by id
    async fn get(&self, id: DisplayId) -> DirectoryResult<Option<Display>>;

    /// Get a display by the hardware identifier it paired with
    async fn find_by_device_identifier(
        &self,
        device_identifier: &str,
    ) -> DirectoryResult<Option<Display>>;

    /// Playlist currently assigned to a display
    async fn current_playlist(&self, id: DisplayId) -> DirectoryResult<Option<Playlist>>;
}

/// Write operations against the display directory
#[async_trait]
pub trait DisplayWriter: Send + Sync {
    /// Create the display or update the existing one with a new pairing
    async fn upsert_paired(&self, paired: PairedDisplay) -> DirectoryResult<Display>;

    /// Persist liveness/status
    async fn update_status(&self, update: DisplayStatusUpdate) -> DirectoryResult<()>;

    /// Forward playback telemetry
    async fn record_playback(&self, id: DisplayId, report: PlaybackReport)
    -> DirectoryResult<()>;
}

/// Combined directory trait
#[async_trait]
pub trait DisplayDirectory: DisplayReader + DisplayWriter {}

// Blanket implementation
impl<T: DisplayReader + DisplayWriter> DisplayDirectory for T {}
