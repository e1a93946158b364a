use std::fmt;
use vizora_core::DashboardEvent;

/// Address of a dashboard listener channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Everything happening to one organization's displays
    Organization(String),
    /// A single pairing code, for listeners waiting on that code
    Pairing(String),
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Organization(id) => write!(f, "org:{}", id),
            Topic::Pairing(code) => write!(f, "pairing:{}", code),
        }
    }
}

/// Publisher for dashboard events
///
/// Events are published to subscribers (dashboard sockets, message queues, etc.)
/// This decouples the gateway logic from the delivery mechanism. Publishing
/// never blocks and never fails: an event nobody listens to is dropped.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to listeners of its organization
    fn publish(&self, event: DashboardEvent);

    /// Publish an event to listeners of one topic only
    fn publish_to(&self, topic: &Topic, event: DashboardEvent);

    /// Get the number of active subscribers
    fn subscriber_count(&self) -> usize;
}
