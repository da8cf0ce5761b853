//! Local copy of the server-side notification state.

use crate::frame::{Envelope, Notification, Snapshot};
use std::time::Duration;
use tokio::time::Instant;

/// Most notifications kept locally.
pub const MAX_NOTIFICATIONS: usize = 20;
/// Minimum spacing between two transient alerts.
pub const ALERT_DEBOUNCE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mirror {
    notifications: Vec<Notification>,
    unread_count: u64,
}

impl Mirror {
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn unread_count(&self) -> u64 {
        self.unread_count
    }

    /// Applies one frame. Returns the notification when the frame announced a new one.
    pub fn apply(&mut self, envelope: &Envelope) -> Option<Notification> {
        match envelope {
            Envelope::Initial(snapshot) | Envelope::Update(snapshot) => {
                self.replace(snapshot);
                None
            }
            Envelope::NewNotification(notification) => {
                self.notifications.insert(0, notification.clone());
                self.notifications.truncate(MAX_NOTIFICATIONS);
                self.unread_count += 1;
                Some(notification.clone())
            }
            Envelope::Heartbeat { .. } => None,
        }
    }

    fn replace(&mut self, snapshot: &Snapshot) {
        self.notifications = snapshot
            .notifications
            .iter()
            .take(MAX_NOTIFICATIONS)
            .cloned()
            .collect();
        self.unread_count = snapshot.unread_count;
    }
}

/// Allows at most one alert per `ALERT_DEBOUNCE` window.
#[derive(Debug, Default)]
pub struct AlertDebouncer {
    last_alert: Option<Instant>,
}

impl AlertDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_alert(&mut self, now: Instant) -> bool {
        match self.last_alert {
            Some(last) if now.saturating_duration_since(last) < ALERT_DEBOUNCE => false,
            _ => {
                self.last_alert = Some(now);
                true
            }
        }
    }
}
