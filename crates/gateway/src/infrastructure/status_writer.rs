//! Write-behind buffer for display liveness
//!
//! Heartbeats arrive far more often than the directory needs to hear about
//! them. Updates are staged per display, newest wins, and flushed on an
//! interval; status transitions are flushed immediately. Writes for one
//! display never overlap, so a slow older write cannot land after a newer
//! one.

use futures_util::future::join_all;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};
use vizora_core::{DisplayId, DisplayStatusUpdate};
use vizora_ports::{DirectoryError, DisplayWriter};

use crate::application::ports::StatusSink;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FlushReport {
    pub written: usize,
    pub failed: usize,
    pub dropped: usize,
}

impl FlushReport {
    fn merge(mut self, other: FlushReport) -> Self {
        self.written += other.written;
        self.failed += other.failed;
        self.dropped += other.dropped;
        self
    }
}

struct Staged {
    update: DisplayStatusUpdate,
    failures: u32,
}

#[derive(Default)]
struct WriterState {
    pending: HashMap<DisplayId, Staged>,
    in_flight: HashSet<DisplayId>,
}

struct Inner<D> {
    directory: Arc<D>,
    state: Mutex<WriterState>,
}

pub struct StatusWriter<D: DisplayWriter + 'static> {
    inner: Arc<Inner<D>>,
}

impl<D: DisplayWriter + 'static> Clone for StatusWriter<D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<D: DisplayWriter + 'static> StatusWriter<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self {
            inner: Arc::new(Inner {
                directory,
                state: Mutex::new(WriterState::default()),
            }),
        }
    }

    /// Displays with an update waiting to be written
    pub fn pending_len(&self) -> usize {
        self.inner.state.lock().pending.len()
    }

    /// Stage an update unless a newer one is already waiting
    fn stage(&self, update: DisplayStatusUpdate) -> bool {
        let mut state = self.inner.state.lock();
        match state.pending.get(&update.display_id) {
            Some(existing) if existing.update.observed_at > update.observed_at => false,
            _ => {
                state.pending.insert(
                    update.display_id,
                    Staged {
                        update,
                        failures: 0,
                    },
                );
                true
            }
        }
    }

    /// Write everything staged
    pub async fn flush(&self) -> FlushReport {
        let ids: Vec<DisplayId> = self.inner.state.lock().pending.keys().copied().collect();
        join_all(ids.into_iter().map(|id| self.drain_display(id)))
            .await
            .into_iter()
            .fold(FlushReport::default(), FlushReport::merge)
    }

    /// Write staged updates for one display until none remain
    ///
    /// Returns early if another task is already writing this display; that
    /// task picks up whatever is staged when its write completes.
    async fn drain_display(&self, display_id: DisplayId) -> FlushReport {
        let mut report = FlushReport::default();
        loop {
            let staged = {
                let mut state = self.inner.state.lock();
                if state.in_flight.contains(&display_id) {
                    return report;
                }
                match state.pending.remove(&display_id) {
                    Some(staged) => {
                        state.in_flight.insert(display_id);
                        staged
                    }
                    None => return report,
                }
            };

            let result = self
                .inner
                .directory
                .update_status(staged.update.clone())
                .await;

            let mut state = self.inner.state.lock();
            state.in_flight.remove(&display_id);
            match result {
                Ok(()) => {
                    report.written += 1;
                }
                Err(DirectoryError::NotFound) => {
                    debug!(%display_id, "Display no longer in directory, dropping status");
                    report.dropped += 1;
                }
                Err(e) => {
                    let failures = staged.failures + 1;
                    warn!(%display_id, failures, error = %e, "Status write failed, will retry");
                    report.failed += 1;
                    // A newer update staged meanwhile supersedes this one
                    state
                        .pending
                        .entry(display_id)
                        .or_insert(Staged {
                            update: staged.update,
                            failures,
                        });
                    return report;
                }
            }
        }
    }
}

impl<D: DisplayWriter + 'static> StatusSink for StatusWriter<D> {
    fn enqueue(&self, update: DisplayStatusUpdate) {
        self.stage(update);
    }

    fn write_through(&self, update: DisplayStatusUpdate) {
        let display_id = update.display_id;
        if self.stage(update) {
            let writer = self.clone();
            tokio::spawn(async move {
                writer.drain_display(display_id).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryDisplayDirectory;
    use chrono::{Duration, Utc};
    use uuid::Uuid;
    use vizora_core::{ConnectionStatus, Display, Timestamp};

    fn seeded() -> (Arc<InMemoryDisplayDirectory>, DisplayId) {
        let directory = Arc::new(InMemoryDisplayDirectory::new());
        let id = Uuid::new_v4();
        directory.insert(Display {
            id,
            device_identifier: "android-1".into(),
            nickname: "Lobby".into(),
            organization_id: "org-1".into(),
            device_token: Some("t".into()),
            active: true,
            status: ConnectionStatus::Offline,
            paired_at: None,
            last_heartbeat_at: None,
            current_content_id: None,
            metrics: None,
            location: None,
            metadata: serde_json::Value::Null,
        });
        (directory, id)
    }

    fn heartbeat(id: DisplayId, at: Timestamp, status: ConnectionStatus) -> DisplayStatusUpdate {
        DisplayStatusUpdate {
            display_id: id,
            status,
            last_heartbeat_at: Some(at),
            metrics: None,
            current_content_id: None,
            observed_at: at,
        }
    }

    #[tokio::test]
    async fn test_heartbeats_coalesce_into_one_write() {
        let (directory, id) = seeded();
        let writer = StatusWriter::new(Arc::clone(&directory));
        let start = Utc::now();

        for i in 0..50 {
            writer.enqueue(heartbeat(
                id,
                start + Duration::seconds(i),
                ConnectionStatus::Online,
            ));
        }
        assert_eq!(writer.pending_len(), 1);

        let report = writer.flush().await;
        assert_eq!(report.written, 1);
        assert_eq!(directory.status_write_count(), 1);
        assert_eq!(
            directory.snapshot(id).unwrap().last_heartbeat_at,
            Some(start + Duration::seconds(49))
        );
    }

    #[tokio::test]
    async fn test_older_update_does_not_replace_staged() {
        let (directory, id) = seeded();
        let writer = StatusWriter::new(Arc::clone(&directory));
        let now = Utc::now();

        writer.enqueue(heartbeat(id, now, ConnectionStatus::Idle));
        writer.enqueue(heartbeat(
            id,
            now - Duration::seconds(5),
            ConnectionStatus::Online,
        ));
        writer.flush().await;

        assert_eq!(directory.snapshot(id).unwrap().status, ConnectionStatus::Idle);
    }

    #[tokio::test]
    async fn test_failed_write_is_retried() {
        let (directory, id) = seeded();
        let writer = StatusWriter::new(Arc::clone(&directory));

        directory.set_available(false);
        writer.enqueue(heartbeat(id, Utc::now(), ConnectionStatus::Online));
        let report = writer.flush().await;
        assert_eq!(report.failed, 1);
        assert_eq!(writer.pending_len(), 1);

        directory.set_available(true);
        let report = writer.flush().await;
        assert_eq!(report.written, 1);
        assert_eq!(writer.pending_len(), 0);
        assert_eq!(
            directory.snapshot(id).unwrap().status,
            ConnectionStatus::Online
        );
    }

    #[tokio::test]
    async fn test_write_through_lands_without_flush() {
        let (directory, id) = seeded();
        let writer = StatusWriter::new(Arc::clone(&directory));

        writer.write_through(DisplayStatusUpdate::status_only(
            id,
            ConnectionStatus::Online,
            Utc::now(),
        ));

        for _ in 0..100 {
            if directory.status_write_count() == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(directory.status_write_count(), 1);
        assert_eq!(writer.pending_len(), 0);
    }

    #[tokio::test]
    async fn test_unknown_display_is_dropped() {
        let directory = Arc::new(InMemoryDisplayDirectory::new());
        let writer = StatusWriter::new(Arc::clone(&directory));

        writer.enqueue(heartbeat(
            Uuid::new_v4(),
            Utc::now(),
            ConnectionStatus::Online,
        ));
        let report = writer.flush().await;
        assert_eq!(report.dropped, 1);
        assert_eq!(writer.pending_len(), 0);
    }
}
