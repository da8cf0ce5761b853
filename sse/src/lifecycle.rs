//! Lifecycle of one notification stream once the caller is authenticated.
//!
//! `Opened` pushes the initial snapshot straight through the fresh sink, then
//! `Streaming` hands the sink to the registry and starts the heartbeat ticker.
//! Both the ticker and the stream's drop hook share one `CancellationToken`;
//! whichever notices the end first runs the teardown, and it only runs once.

use crate::connection::{ConnectionId, ConnectionRegistry, Frame, PushError, Sink, SubscriberId};
use crate::message::{Envelope, Snapshot};
use futures::Stream;
use log::*;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Streaming,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The transport dropped the response body (client went away or a write failed).
    Disconnected,
    /// A heartbeat could not be delivered.
    HeartbeatFailed,
}

/// Shared teardown state of one registered connection.
struct Connection {
    registry: Arc<ConnectionRegistry>,
    subscriber_id: SubscriberId,
    connection_id: ConnectionId,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl Connection {
    fn push(&self, envelope: &Envelope) -> Result<(), PushError> {
        self.registry
            .push(&self.subscriber_id, &self.connection_id, envelope)
    }

    fn close(&self, reason: CloseReason) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        self.cancel.cancel();
        self.registry
            .remove_connection(&self.subscriber_id, &self.connection_id);

        info!(
            "Notification stream {} for subscriber {} closed ({reason:?})",
            self.connection_id, self.subscriber_id
        );
    }

    fn state(&self) -> StreamState {
        if self.closed.load(Ordering::Acquire) {
            StreamState::Closed
        } else {
            StreamState::Streaming
        }
    }
}

/// The live frame stream of one connection.
///
/// Yields serialized envelopes in push order. Dropping it closes the connection.
pub struct NotificationStream {
    frames: UnboundedReceiver<Frame>,
    connection: Arc<Connection>,
}

impl NotificationStream {
    pub fn connection_id(&self) -> &ConnectionId {
        &self.connection.connection_id
    }

    pub fn state(&self) -> StreamState {
        self.connection.state()
    }
}

impl Stream for NotificationStream {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.frames.poll_recv(cx)
    }
}

impl Drop for NotificationStream {
    fn drop(&mut self) {
        self.connection.close(CloseReason::Disconnected);
    }
}

/// Opens a stream for `subscriber_id`: initial snapshot first, then registration and heartbeats.
/// Must be called from within a Tokio runtime.
pub(crate) fn open(
    registry: Arc<ConnectionRegistry>,
    subscriber_id: SubscriberId,
    snapshot: Snapshot,
    heartbeat_interval: Duration,
) -> NotificationStream {
    let (sender, frames) = unbounded_channel();
    let sink = Sink::new(sender);

    // Opened: nothing else can write to this sink before it is registered.
    match serde_json::to_string(&Envelope::Initial(snapshot)) {
        Ok(frame) => {
            if let Err(e) = sink.push(frame) {
                warn!("Failed to queue initial snapshot for {subscriber_id}: {e}");
            }
        }
        Err(e) => error!("Failed to serialize initial snapshot for {subscriber_id}: {e}"),
    }

    let connection = Arc::new(Connection {
        registry: registry.clone(),
        subscriber_id: subscriber_id.clone(),
        connection_id: sink.id().clone(),
        cancel: CancellationToken::new(),
        closed: AtomicBool::new(false),
    });

    // Streaming: from here on every push goes through the registry.
    registry.add_connection(&subscriber_id, sink);
    tokio::spawn(heartbeat(connection.clone(), heartbeat_interval));

    info!(
        "Opened notification stream {} for subscriber {subscriber_id}",
        connection.connection_id
    );

    NotificationStream { frames, connection }
}

async fn heartbeat(connection: Arc<Connection>, period: Duration) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = connection.cancel.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = connection.push(&Envelope::heartbeat()) {
                    warn!(
                        "Heartbeat to connection {} failed: {e}",
                        connection.connection_id
                    );
                    connection.close(CloseReason::HeartbeatFailed);
                    break;
                }
                trace!("Heartbeat sent to connection {}", connection.connection_id);
            }
        }
    }
}
