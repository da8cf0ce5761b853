//! Keeps a live notification stream open and mirrors its state.
//!
//! The controller runs on its own task. Every transport failure is followed
//! by a reconnect after `backoff::delay(attempt)`; after `MAX_ATTEMPTS`
//! consecutive failures it stops and reports `Unavailable` until the
//! visibility trigger re-arms it. Dropping the handle cancels the task, which
//! closes the transport and any pending reconnect timer.

use crate::backoff::Backoff;
use crate::frame::{Envelope, Notification};
use crate::mirror::{AlertDebouncer, Mirror};
use crate::transport::{FrameStream, Transport, TransportError};
use futures::StreamExt;
use log::*;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting `delay` before reconnect number `attempt` (one based).
    Reconnecting { delay: Duration, attempt: u32 },
    /// Retry budget spent; only the visibility trigger reconnects.
    Unavailable,
}

/// Owner's side of a running controller.
pub struct ControllerHandle {
    status: watch::Receiver<ConnectionStatus>,
    mirror: watch::Receiver<Mirror>,
    alerts: mpsc::UnboundedReceiver<Notification>,
    visibility: mpsc::UnboundedSender<()>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    pub fn status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.clone()
    }

    pub fn mirror(&self) -> watch::Receiver<Mirror> {
        self.mirror.clone()
    }

    /// Next transient alert. At most one is produced per debounce window.
    pub async fn next_alert(&mut self) -> Option<Notification> {
        self.alerts.recv().await
    }

    pub fn try_next_alert(&mut self) -> Option<Notification> {
        self.alerts.try_recv().ok()
    }

    /// The consumer became visible again: reconnect now if not connected.
    pub fn visibility_regained(&self) {
        let _ = self.visibility.send(());
    }

    /// Cancels the controller and waits for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!("Notification controller task failed: {e}");
        }
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Starts a controller over `transport` on the current runtime.
pub fn spawn<T: Transport + 'static>(transport: T) -> ControllerHandle {
    let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
    let (mirror_tx, mirror_rx) = watch::channel(Mirror::default());
    let (alerts_tx, alerts_rx) = mpsc::unbounded_channel();
    let (visibility_tx, visibility_rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();

    let controller = Controller {
        transport,
        status: status_tx,
        mirror: mirror_tx,
        alerts: alerts_tx,
        visibility: visibility_rx,
        cancel: cancel.clone(),
        debouncer: AlertDebouncer::new(),
    };

    ControllerHandle {
        status: status_rx,
        mirror: mirror_rx,
        alerts: alerts_rx,
        visibility: visibility_tx,
        cancel,
        task: tokio::spawn(controller.run()),
    }
}

struct Controller<T> {
    transport: T,
    status: watch::Sender<ConnectionStatus>,
    mirror: watch::Sender<Mirror>,
    alerts: mpsc::UnboundedSender<Notification>,
    visibility: mpsc::UnboundedReceiver<()>,
    cancel: CancellationToken,
    debouncer: AlertDebouncer,
}

// Why the controller stopped waiting.
enum Wake {
    Cancelled,
    Visible,
    Elapsed,
}

impl<T: Transport> Controller<T> {
    async fn run(mut self) {
        let mut backoff = Backoff::new();

        loop {
            self.set_status(ConnectionStatus::Connecting);

            let connected = {
                let connect = self.transport.connect();
                tokio::pin!(connect);
                loop {
                    tokio::select! {
                        biased;
                        _ = self.cancel.cancelled() => break None,
                        signal = self.visibility.recv() => {
                            if signal.is_none() {
                                break None;
                            }
                            // Only a disconnected controller re-arms
                            trace!("Visibility regained while connecting");
                        }
                        result = &mut connect => break Some(result),
                    }
                }
            };
            let Some(connected) = connected else {
                break;
            };

            let error = match connected {
                Ok(frames) => {
                    backoff.reset();
                    self.set_status(ConnectionStatus::Connected);
                    match self.stream(frames).await {
                        Some(error) => error,
                        None => break,
                    }
                }
                Err(error) => error,
            };

            warn!("Notification stream unavailable: {error}");
            self.set_status(ConnectionStatus::Disconnected);

            let wake = match backoff.next_delay() {
                Some(delay) => {
                    self.set_status(ConnectionStatus::Reconnecting {
                        delay,
                        attempt: backoff.attempt(),
                    });
                    self.wait(Some(delay)).await
                }
                None => {
                    error!(
                        "Giving up after {} reconnect attempts; waiting for visibility",
                        backoff.attempt()
                    );
                    self.set_status(ConnectionStatus::Unavailable);
                    self.wait(None).await
                }
            };

            match wake {
                Wake::Cancelled => break,
                Wake::Visible => {
                    info!("Visibility regained, reconnecting now");
                    backoff.reset();
                }
                Wake::Elapsed => {}
            }
        }

        self.set_status(ConnectionStatus::Disconnected);
        debug!("Notification controller stopped");
    }

    /// Reads frames until the stream fails (`Some`) or the controller is cancelled (`None`).
    async fn stream(&mut self, mut frames: FrameStream) -> Option<TransportError> {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return None,
                signal = self.visibility.recv() => {
                    if signal.is_none() {
                        return None;
                    }
                    // Already connected; nothing to re-arm
                }
                frame = frames.next() => match frame {
                    Some(Ok(envelope)) => self.apply(envelope),
                    Some(Err(error)) => return Some(error),
                    None => return Some(TransportError::Closed),
                },
            }
        }
    }

    /// Waits for `delay` (forever when `None`), a visibility signal or cancellation.
    async fn wait(&mut self, delay: Option<Duration>) -> Wake {
        let timer = async {
            match delay {
                Some(delay) => sleep(delay).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Wake::Cancelled,
            signal = self.visibility.recv() => match signal {
                Some(()) => Wake::Visible,
                None => Wake::Cancelled,
            },
            _ = timer => Wake::Elapsed,
        }
    }

    fn apply(&mut self, envelope: Envelope) {
        if let Envelope::Heartbeat { timestamp } = &envelope {
            trace!("Heartbeat at {timestamp}");
            return;
        }

        let mut announced = None;
        self.mirror.send_modify(|mirror| announced = mirror.apply(&envelope));

        if let Some(notification) = announced {
            if self.debouncer.should_alert(Instant::now()) {
                let _ = self.alerts.send(notification);
            } else {
                debug!("Suppressed alert for {}", notification.id);
            }
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!("Notification stream: {previous:?} -> {status:?}");
        }
    }
}
