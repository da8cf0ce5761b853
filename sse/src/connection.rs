use crate::message::{Envelope, EventType};
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Identity that owns a stream (the web layer converts `domain::Id` to `String`).
pub type SubscriberId = String;

/// One serialized envelope, ready to be written as an event-stream `data:` line.
pub type Frame = String;

/// Unique identifier for a connection (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a push to a single connection did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    /// The connection is not (or no longer) registered under the subscriber.
    NotRegistered,
    /// The remote end is gone; the sink has been evicted.
    Closed,
    /// The envelope could not be serialized.
    Encode,
}

impl fmt::Display for PushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PushError::NotRegistered => write!(f, "connection is not registered"),
            PushError::Closed => write!(f, "connection is closed"),
            PushError::Encode => write!(f, "envelope could not be encoded"),
        }
    }
}

impl std::error::Error for PushError {}

/// Write-only handle onto one live connection.
/// Sinks compare equal by their `ConnectionId`.
#[derive(Debug, Clone)]
pub struct Sink {
    id: ConnectionId,
    sender: UnboundedSender<Frame>,
}

impl Sink {
    pub fn new(sender: UnboundedSender<Frame>) -> Self {
        Self {
            id: ConnectionId::new(),
            sender,
        }
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Writes one frame. Fails only when the receiving end has been dropped.
    pub(crate) fn push(&self, frame: Frame) -> Result<(), PushError> {
        self.sender.send(frame).map_err(|_| PushError::Closed)
    }
}

impl PartialEq for Sink {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Sink {}

/// Connection information stored in the primary index
#[derive(Debug, Clone)]
struct ConnectionInfo {
    subscriber_id: SubscriberId,
    sink: Sink,
}

/// Process-wide registry of live notification sinks with dual indices for O(1) lookups.
///
/// Both indices are sharded maps, so registration, removal and broadcast from
/// independent tasks only contend on the shard that holds the subscriber.
/// A subscriber without sinks has no entry in the subscriber index.
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup - O(1)
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: fast lookup by subscriber for message routing - O(1)
    subscriber_index: DashMap<SubscriberId, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            subscriber_index: DashMap::new(),
        }
    }

    /// Registers `sink` under `subscriber_id`. Registering the same pair twice is a no-op;
    /// registering a sink under a new subscriber moves it there.
    pub fn add_connection(&self, subscriber_id: &str, sink: Sink) {
        let connection_id = sink.id().clone();

        let previous = self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                subscriber_id: subscriber_id.to_owned(),
                sink,
            },
        );
        if let Some(previous) = previous {
            if previous.subscriber_id != subscriber_id {
                self.detach(&previous.subscriber_id, &connection_id);
            }
        }

        self.subscriber_index
            .entry(subscriber_id.to_owned())
            .or_default()
            .insert(connection_id.clone());

        debug!("Registered connection {connection_id} for subscriber {subscriber_id}");
    }

    /// Removes the sink from the subscriber's set, dropping the entry once it is empty.
    /// Absent pairs are ignored so racing cleanups are harmless.
    pub fn remove_connection(&self, subscriber_id: &str, connection_id: &ConnectionId) {
        let removed = self
            .connections
            .remove_if(connection_id, |_, info| info.subscriber_id == subscriber_id)
            .is_some();

        self.detach(subscriber_id, connection_id);

        if removed {
            debug!("Removed connection {connection_id} for subscriber {subscriber_id}");
        } else {
            trace!("Connection {connection_id} for subscriber {subscriber_id} already removed");
        }
    }

    fn detach(&self, subscriber_id: &str, connection_id: &ConnectionId) {
        if let Some(mut connection_ids) = self.subscriber_index.get_mut(subscriber_id) {
            connection_ids.remove(connection_id);
        }
        self.subscriber_index
            .remove_if(subscriber_id, |_, connection_ids| connection_ids.is_empty());
    }

    /// Pushes `envelope` to every sink currently registered under `subscriber_id`.
    ///
    /// A sink whose remote end is gone is evicted and the remaining sinks still
    /// receive the envelope. Returns the number of sinks that accepted it.
    pub fn broadcast(&self, subscriber_id: &str, envelope: &Envelope) -> usize {
        let frame = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize {} envelope: {e}", envelope.event_type());
                return 0;
            }
        };

        // Snapshot the ids so no index lock is held while pushing or evicting.
        let connection_ids: Vec<ConnectionId> = match self.subscriber_index.get(subscriber_id) {
            Some(connection_ids) => connection_ids.iter().cloned().collect(),
            None => {
                trace!("No live connections for subscriber {subscriber_id}");
                return 0;
            }
        };

        let mut delivered = 0;
        let mut dead = Vec::new();
        for connection_id in connection_ids {
            let pushed = self
                .connections
                .get(&connection_id)
                .map(|info| info.sink.push(frame.clone()));

            match pushed {
                Some(Ok(())) => delivered += 1,
                Some(Err(_)) => dead.push(connection_id),
                None => {}
            }
        }

        for connection_id in dead {
            warn!(
                "Failed to send {} to connection {}. Evicting it.",
                envelope.event_type(),
                connection_id
            );
            self.remove_connection(subscriber_id, &connection_id);
        }

        delivered
    }

    /// Pushes `envelope` to one registered connection of `subscriber_id`.
    /// A closed sink is evicted before the error is returned.
    pub fn push(
        &self,
        subscriber_id: &str,
        connection_id: &ConnectionId,
        envelope: &Envelope,
    ) -> Result<(), PushError> {
        let frame = serde_json::to_string(envelope).map_err(|e| {
            error!("Failed to serialize {} envelope: {e}", envelope.event_type());
            PushError::Encode
        })?;

        let pushed = match self.connections.get(connection_id) {
            Some(info) if info.subscriber_id == subscriber_id => info.sink.push(frame),
            _ => return Err(PushError::NotRegistered),
        };

        if pushed.is_err() {
            self.remove_connection(subscriber_id, connection_id);
        }
        pushed
    }

    pub fn connection_count(&self, subscriber_id: &str) -> usize {
        self.subscriber_index
            .get(subscriber_id)
            .map(|connection_ids| connection_ids.len())
            .unwrap_or(0)
    }

    pub fn total_connections(&self) -> usize {
        self.connections.len()
    }

    /// Whether the subscriber index holds an entry for `subscriber_id`.
    pub fn has_entry(&self, subscriber_id: &str) -> bool {
        self.subscriber_index.contains_key(subscriber_id)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
