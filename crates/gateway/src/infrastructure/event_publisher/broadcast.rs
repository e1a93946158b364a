use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use vizora_core::DashboardEvent;

use crate::application::ports::{EventPublisher, Topic};

/// Broadcast-based dashboard event publisher
///
/// Uses tokio broadcast channels, one per topic. A topic's channel is
/// created by its first subscriber and dropped once nobody listens.
pub struct BroadcastEventPublisher {
    /// Per-topic broadcast channels
    topic_channels: Arc<DashMap<Topic, broadcast::Sender<DashboardEvent>>>,
    /// Subscriber count
    subscriber_count: Arc<AtomicUsize>,
    /// Channel capacity
    capacity: usize,
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        BroadcastEventPublisher {
            topic_channels: Arc::new(DashMap::new()),
            subscriber_count: Arc::new(AtomicUsize::new(0)),
            capacity: capacity.max(1),
        }
    }

    /// Subscribe to one topic
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<DashboardEvent> {
        self.subscriber_count.fetch_add(1, Ordering::SeqCst);

        let entry = self.topic_channels.entry(topic).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.capacity);
            tx
        });

        entry.value().subscribe()
    }

    /// Unsubscribe (decrement counter)
    pub fn unsubscribe(&self) {
        self.subscriber_count.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of topics with a live channel
    pub fn topic_count(&self) -> usize {
        self.topic_channels.len()
    }

    fn send(&self, topic: &Topic, event: DashboardEvent) {
        if let Some(tx) = self.topic_channels.get(topic) {
            // Ignore send errors (no subscribers)
            let _ = tx.send(event);
        }
        self.topic_channels
            .remove_if(topic, |_, tx| tx.receiver_count() == 0);
    }
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl Clone for BroadcastEventPublisher {
    fn clone(&self) -> Self {
        BroadcastEventPublisher {
            topic_channels: Arc::clone(&self.topic_channels),
            subscriber_count: Arc::clone(&self.subscriber_count),
            capacity: self.capacity,
        }
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: DashboardEvent) {
        let topic = Topic::Organization(event.organization_id().to_string());
        self.send(&topic, event);
    }

    fn publish_to(&self, topic: &Topic, event: DashboardEvent) {
        self.send(topic, event);
    }

    fn subscriber_count(&self) -> usize {
        self.subscriber_count.load(Ordering::SeqCst)
    }
}
