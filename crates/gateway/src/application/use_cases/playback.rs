use std::sync::Arc;
use tracing::{debug, warn};
use vizora_core::{DisplayId, PlaybackReport, Playlist};
use vizora_ports::{DirectoryResult, DisplayDirectory};

/// Playback telemetry and playlist sync for connected devices
pub struct PlaybackUseCase<D: DisplayDirectory> {
    directory: Arc<D>,
}

impl<D: DisplayDirectory> PlaybackUseCase<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Forward a report; failures are logged and never reach the device
    pub async fn record(&self, display_id: DisplayId, report: PlaybackReport) -> bool {
        if let PlaybackReport::Error {
            error_type,
            error_message,
            ..
        } = &report
        {
            warn!(%display_id, error_type = %error_type, error_message = ?error_message, "Device reported playback error");
        }

        match self.directory.record_playback(display_id, report).await {
            Ok(()) => {
                debug!(%display_id, "Playback report recorded");
                true
            }
            Err(e) => {
                warn!(%display_id, error = %e, "Failed to record playback report");
                false
            }
        }
    }

    /// Playlist currently assigned to the display
    pub async fn current_playlist(&self, display_id: DisplayId) -> DirectoryResult<Option<Playlist>> {
        self.directory.current_playlist(display_id).await
    }
}
