use crate::connection::{ConnectionRegistry, SubscriberId};
use crate::lifecycle::{self, NotificationStream};
use crate::message::{Envelope, EventType, Snapshot};
use log::*;
use std::sync::Arc;
use std::time::Duration;

/// Default interval between heartbeat frames on an idle stream.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Entry point for the web layer and the domain event handler.
///
/// Constructed once at startup and shared behind an `Arc`; every instance owns
/// an isolated registry.
pub struct Manager {
    registry: Arc<ConnectionRegistry>,
    heartbeat_interval: Duration,
}

impl Manager {
    pub fn new(heartbeat_interval: Duration) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            heartbeat_interval,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn heartbeat_interval(&self) -> Duration {
        self.heartbeat_interval
    }

    /// Opens a live stream for an already authenticated subscriber.
    pub fn open_stream(&self, subscriber_id: SubscriberId, snapshot: Snapshot) -> NotificationStream {
        lifecycle::open(
            self.registry.clone(),
            subscriber_id,
            snapshot,
            self.heartbeat_interval,
        )
    }

    /// Best-effort delivery to every live connection of `subscriber_id`.
    pub fn broadcast(&self, subscriber_id: &str, envelope: &Envelope) -> usize {
        let delivered = self.registry.broadcast(subscriber_id, envelope);
        debug!(
            "Delivered {} to {delivered} connection(s) of subscriber {subscriber_id}",
            envelope.event_type()
        );
        delivered
    }

    pub fn connection_count(&self, subscriber_id: &str) -> usize {
        self.registry.connection_count(subscriber_id)
    }

    pub fn total_connections(&self) -> usize {
        self.registry.total_connections()
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new(DEFAULT_HEARTBEAT_INTERVAL)
    }
}
