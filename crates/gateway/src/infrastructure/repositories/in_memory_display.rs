use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use vizora_core::{
    ConnectionStatus, Display, DisplayId, DisplayStatusUpdate, PlaybackReport, Playlist,
};
use vizora_ports::{
    DirectoryError, DirectoryResult, DisplayReader, DisplayWriter, PairedDisplay,
};

/// Playback reports kept per display
const PLAYBACK_HISTORY: usize = 100;

/// In-memory display directory
///
/// Stands in for the external display service. It can be switched
/// unavailable or slowed down to exercise the gateway's degraded paths.
pub struct InMemoryDisplayDirectory {
    displays: Arc<DashMap<DisplayId, Display>>,
    playlists: Arc<DashMap<DisplayId, Playlist>>,
    playback: Arc<DashMap<DisplayId, VecDeque<PlaybackReport>>>,
    available: Arc<AtomicBool>,
    writable: Arc<AtomicBool>,
    read_delay_ms: Arc<AtomicU64>,
    status_writes: Arc<AtomicUsize>,
}

impl InMemoryDisplayDirectory {
    pub fn new() -> Self {
        Self {
            displays: Arc::new(DashMap::new()),
            playlists: Arc::new(DashMap::new()),
            playback: Arc::new(DashMap::new()),
            available: Arc::new(AtomicBool::new(true)),
            writable: Arc::new(AtomicBool::new(true)),
            read_delay_ms: Arc::new(AtomicU64::new(0)),
            status_writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Toggle availability; while unavailable every call fails
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Toggle writes only; reads keep working
    pub fn set_writable(&self, writable: bool) {
        self.writable.store(writable, Ordering::SeqCst);
    }

    /// Delay every display lookup by `delay`
    pub fn set_read_delay(&self, delay: Duration) {
        self.read_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Status writes accepted so far
    pub fn status_write_count(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    /// Seed or replace a display record
    pub fn insert(&self, display: Display) {
        self.displays.insert(display.id, display);
    }

    /// Unpair a display as an administrator would
    pub fn deactivate(&self, id: DisplayId) -> bool {
        match self.displays.get_mut(&id) {
            Some(mut display) => {
                display.active = false;
                display.device_token = None;
                true
            }
            None => false,
        }
    }

    pub fn assign_playlist(&self, id: DisplayId, playlist: Playlist) {
        self.playlists.insert(id, playlist);
    }

    pub fn playback_reports(&self, id: DisplayId) -> Vec<PlaybackReport> {
        self.playback
            .get(&id)
            .map(|reports| reports.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Synchronous read used by tests and health checks
    pub fn snapshot(&self, id: DisplayId) -> Option<Display> {
        self.displays.get(&id).map(|d| d.value().clone())
    }

    fn ensure_available(&self) -> DirectoryResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable(
                "display directory is offline".to_string(),
            ))
        }
    }

    fn ensure_writable(&self) -> DirectoryResult<()> {
        self.ensure_available()?;
        if self.writable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable(
                "display directory is read-only".to_string(),
            ))
        }
    }
}

impl Default for InMemoryDisplayDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for InMemoryDisplayDirectory {
    fn clone(&self) -> Self {
        Self {
            displays: Arc::clone(&self.displays),
            playlists: Arc::clone(&self.playlists),
            playback: Arc::clone(&self.playback),
            available: Arc::clone(&self.available),
            writable: Arc::clone(&self.writable),
            read_delay_ms: Arc::clone(&self.read_delay_ms),
            status_writes: Arc::clone(&self.status_writes),
        }
    }
}

#[async_trait]
impl DisplayReader for InMemoryDisplayDirectory {
    async fn get(&self, id: DisplayId) -> DirectoryResult<Option<Display>> {
        let delay = self.read_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        self.ensure_available()?;
        Ok(self.snapshot(id))
    }

    async fn find_by_device_identifier(
        &self,
        device_identifier: &str,
    ) -> DirectoryResult<Option<Display>> {
        self.ensure_available()?;
        Ok(self
            .displays
            .iter()
            .find(|entry| entry.value().device_identifier == device_identifier)
            .map(|entry| entry.value().clone()))
    }

    async fn current_playlist(&self, id: DisplayId) -> DirectoryResult<Option<Playlist>> {
        self.ensure_available()?;
        Ok(self.playlists.get(&id).map(|p| p.value().clone()))
    }
}

#[async_trait]
impl DisplayWriter for InMemoryDisplayDirectory {
    async fn upsert_paired(&self, paired: PairedDisplay) -> DirectoryResult<Display> {
        self.ensure_writable()?;

        let mut display = self
            .displays
            .entry(paired.id)
            .or_insert_with(|| Display {
                id: paired.id,
                device_identifier: paired.device_identifier.clone(),
                nickname: paired.nickname.clone(),
                organization_id: paired.organization_id.clone(),
                device_token: None,
                active: false,
                status: ConnectionStatus::Offline,
                paired_at: None,
                last_heartbeat_at: None,
                current_content_id: None,
                metrics: None,
                location: None,
                metadata: serde_json::Value::Null,
            });

        display.device_identifier = paired.device_identifier;
        display.nickname = paired.nickname;
        display.organization_id = paired.organization_id;
        display.device_token = Some(paired.device_token);
        display.active = true;
        display.status = ConnectionStatus::Online;
        display.paired_at = Some(paired.paired_at);
        display.location = paired.location.or(display.location.take());
        display.metadata = paired.metadata;

        Ok(display.value().clone())
    }

    async fn update_status(&self, update: DisplayStatusUpdate) -> DirectoryResult<()> {
        self.ensure_writable()?;
        let mut display = self
            .displays
            .get_mut(&update.display_id)
            .ok_or(DirectoryError::NotFound)?;
        display.apply_status(&update);
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn record_playback(&self, id: DisplayId, report: PlaybackReport) -> DirectoryResult<()> {
        self.ensure_writable()?;
        let mut reports = self.playback.entry(id).or_default();
        if reports.len() == PLAYBACK_HISTORY {
            reports.pop_front();
        }
        reports.push_back(report);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn paired(id: DisplayId, token: &str) -> PairedDisplay {
        PairedDisplay {
            id,
            device_identifier: "android-1".into(),
            nickname: "Lobby".into(),
            organization_id: "org-1".into(),
            device_token: token.into(),
            paired_at: Utc::now(),
            location: Some("lobby-pc".into()),
            metadata: serde_json::json!({"hostname": "lobby-pc"}),
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_rotates_token() {
        let directory = InMemoryDisplayDirectory::new();
        let id = Uuid::new_v4();

        let created = directory.upsert_paired(paired(id, "t1")).await.unwrap();
        assert!(created.is_paired());
        assert!(created.accepts_token("t1"));

        let updated = directory.upsert_paired(paired(id, "t2")).await.unwrap();
        assert!(!updated.accepts_token("t1"));
        assert!(updated.accepts_token("t2"));
        assert_eq!(
            directory
                .find_by_device_identifier("android-1")
                .await
                .unwrap()
                .map(|d| d.id),
            Some(id)
        );
    }

    #[tokio::test]
    async fn test_unavailable_directory_fails_calls() {
        let directory = InMemoryDisplayDirectory::new();
        directory.set_available(false);

        assert!(matches!(
            directory.get(Uuid::new_v4()).await,
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(directory.upsert_paired(paired(Uuid::new_v4(), "t")).await.is_err());
    }

    #[tokio::test]
    async fn test_status_update_for_unknown_display() {
        let directory = InMemoryDisplayDirectory::new();
        let update =
            DisplayStatusUpdate::status_only(Uuid::new_v4(), ConnectionStatus::Online, Utc::now());
        assert_eq!(
            directory.update_status(update).await,
            Err(DirectoryError::NotFound)
        );
        assert_eq!(directory.status_write_count(), 0);
    }

    #[tokio::test]
    async fn test_status_update_leaves_unpaired_display_alone() {
        let directory = InMemoryDisplayDirectory::new();
        let id = Uuid::new_v4();
        directory.upsert_paired(paired(id, "t1")).await.unwrap();
        directory.deactivate(id);

        let update = DisplayStatusUpdate {
            last_heartbeat_at: Some(Utc::now()),
            ..DisplayStatusUpdate::status_only(id, ConnectionStatus::Error, Utc::now())
        };
        directory.update_status(update).await.unwrap();

        let display = directory.snapshot(id).unwrap();
        assert!(!display.active);
        assert_eq!(display.status, ConnectionStatus::Online);
        assert_eq!(display.last_heartbeat_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_delay_slows_lookups() {
        let directory = InMemoryDisplayDirectory::new();
        directory.set_read_delay(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        assert_eq!(directory.get(Uuid::new_v4()).await, Ok(None));
        assert!(started.elapsed() >= Duration::from_secs(5));
    }
}
