//! Periodic background work
//!
//! Each task owns `Arc`s of what it touches and runs until aborted.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};
use vizora_ports::{Clock, DisplayWriter, PairingStore};

use crate::application::ports::{ConnectionRateLimiter, EventPublisher, StatusSink};
use crate::application::use_cases::DevicePresenceUseCase;

use super::status_writer::StatusWriter;

/// Take silent devices offline every `every`
pub fn spawn_liveness_sweep<C, S, E>(
    presence: DevicePresenceUseCase<C, S, E>,
    every: Duration,
    timeout: chrono::Duration,
) -> JoinHandle<()>
where
    C: Clock + 'static,
    S: StatusSink + 'static,
    E: EventPublisher + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let expired = presence.sweep(timeout);
            if !expired.is_empty() {
                info!(count = expired.len(), "Liveness sweep took devices offline");
            }
        }
    })
}

/// Flush coalesced status updates every `every`
pub fn spawn_status_flush<D>(writer: StatusWriter<D>, every: Duration) -> JoinHandle<()>
where
    D: DisplayWriter + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let report = writer.flush().await;
            if report.written + report.failed + report.dropped > 0 {
                debug!(
                    written = report.written,
                    failed = report.failed,
                    dropped = report.dropped,
                    "Status flush"
                );
            }
        }
    })
}

/// Drop pairing sessions that expired more than `retention` ago
pub fn spawn_pairing_purge<C, S>(
    clock: Arc<C>,
    store: Arc<S>,
    every: Duration,
    retention: chrono::Duration,
) -> JoinHandle<()>
where
    C: Clock + 'static,
    S: PairingStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let purged = store.purge_expired(clock.now() - retention).await;
            if purged > 0 {
                debug!(purged, "Purged expired pairing sessions");
            }
        }
    })
}

/// Forget rate limit state of clients that have fully recovered
pub fn spawn_rate_limit_prune<L>(limiter: Arc<L>, every: Duration) -> JoinHandle<()>
where
    L: ConnectionRateLimiter + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let pruned = limiter.prune_idle();
            if pruned > 0 {
                debug!(pruned, "Pruned idle connection rate limit buckets");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::registry::{ConnectionHandle, ConnectionRegistry};
    use crate::application::use_cases::AuthenticatedDevice;
    use crate::application::ports::RateLimitConfig;
    use crate::infrastructure::{
        BroadcastEventPublisher, InMemoryDisplayDirectory, InMemoryPairingStore,
        TokenBucketRateLimiter,
    };
    use uuid::Uuid;
    use vizora_clock::ManualClock;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_removes_silent_device() {
        let clock = Arc::new(ManualClock::starting_now());
        let registry = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(InMemoryDisplayDirectory::new());
        let presence = DevicePresenceUseCase::new(
            Arc::clone(&clock),
            Arc::clone(&registry),
            Arc::new(StatusWriter::new(directory)),
            Arc::new(BroadcastEventPublisher::new(16)),
        );
        let device = AuthenticatedDevice {
            display_id: Uuid::new_v4(),
            organization_id: "org-1".into(),
            device_identifier: "android-1".into(),
            nickname: "Lobby".into(),
        };
        let (handle, _rx) = ConnectionHandle::new("org-1", 4);
        presence.connect(&device, handle);

        let task = spawn_liveness_sweep(
            presence,
            Duration::from_secs(5),
            chrono::Duration::seconds(45),
        );

        clock.advance(chrono::Duration::seconds(46));
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(registry.is_empty());
        task.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_drops_old_sessions() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(InMemoryPairingStore::new(
            Arc::clone(&clock),
            chrono::Duration::minutes(10),
        ));
        store
            .create("android-1", None, serde_json::Value::Null)
            .await
            .unwrap();

        let task = spawn_pairing_purge(
            Arc::clone(&clock),
            Arc::clone(&store),
            Duration::from_secs(60),
            chrono::Duration::hours(1),
        );

        clock.advance(chrono::Duration::hours(2));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert!(store.is_empty());
        task.abort();
    }

    #[tokio::test]
    async fn test_prune_task_forgets_recovered_clients() {
        let limiter = Arc::new(TokenBucketRateLimiter::new(RateLimitConfig {
            connections_per_ip_per_minute: 6000,
            ..Default::default()
        }));
        for i in 0..50 {
            limiter.check_connection(&format!("10.1.0.{}", i));
        }
        assert_eq!(limiter.tracked_clients(), 50);

        let task = spawn_rate_limit_prune(Arc::clone(&limiter), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(limiter.tracked_clients(), 0);
        task.abort();
    }
}
