use crate::message::{Envelope, Snapshot};
use crate::Manager;
use async_trait::async_trait;
use events::{DomainEvent, EventHandler};
use log::*;
use std::sync::Arc;

/// Handles domain events by converting them to stream envelopes and delivering
/// them to the live connections of the affected subscriber.
///
/// This is the only place producers reach the registry from, so replacing
/// process-local delivery with a shared backplane means registering a
/// different `EventHandler`.
pub struct SseDomainEventHandler {
    sse_manager: Arc<Manager>,
}

impl SseDomainEventHandler {
    pub fn new(sse_manager: Arc<Manager>) -> Self {
        Self { sse_manager }
    }
}

#[async_trait]
impl EventHandler for SseDomainEventHandler {
    async fn handle(&self, event: &DomainEvent) {
        let subscriber_id = event.user_id().to_string();

        let envelope = match event {
            DomainEvent::NotificationCreated { notification, .. } => {
                debug!("Handling NotificationCreated event for user {subscriber_id}");
                Envelope::NewNotification(notification.clone())
            }
            DomainEvent::NotificationsUpdated { snapshot, .. } => {
                debug!("Handling NotificationsUpdated event for user {subscriber_id}");
                match serde_json::from_value::<Snapshot>(snapshot.clone()) {
                    Ok(snapshot) => Envelope::Update(Snapshot::new(
                        snapshot.notifications,
                        snapshot.unread_count,
                    )),
                    Err(e) => {
                        error!("Malformed snapshot for user {subscriber_id}: {e}");
                        return;
                    }
                }
            }
        };

        self.sse_manager.broadcast(&subscriber_id, &envelope);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::{EventPublisher, Id};
    use futures::StreamExt;
    use serde_json::{json, Value};

    async fn next_frame(stream: &mut crate::lifecycle::NotificationStream) -> Value {
        serde_json::from_str(&stream.next().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn created_notification_becomes_a_new_notification_frame() {
        let manager = Arc::new(Manager::default());
        let publisher =
            EventPublisher::new().with_handler(Arc::new(SseDomainEventHandler::new(manager.clone())));
        let user_id = Id::new_v4();
        let mut stream = manager.open_stream(user_id.to_string(), Snapshot::empty());

        publisher
            .publish(DomainEvent::NotificationCreated {
                user_id,
                notification: json!({"id": "n1", "title": "New feedback"}),
            })
            .await;

        assert_eq!(next_frame(&mut stream).await["type"], "initial");
        let frame = next_frame(&mut stream).await;
        assert_eq!(frame["type"], "new_notification");
        assert_eq!(frame["payload"]["title"], "New feedback");
    }

    #[tokio::test]
    async fn updated_snapshot_becomes_an_update_frame() {
        let manager = Arc::new(Manager::default());
        let handler = SseDomainEventHandler::new(manager.clone());
        let user_id = Id::new_v4();
        let mut stream = manager.open_stream(user_id.to_string(), Snapshot::empty());

        handler
            .handle(&DomainEvent::NotificationsUpdated {
                user_id,
                snapshot: json!({"notifications": [{"id": "n1"}], "unreadCount": 0}),
            })
            .await;

        let _initial = next_frame(&mut stream).await;
        assert_eq!(
            next_frame(&mut stream).await,
            json!({
                "type": "update",
                "payload": {"notifications": [{"id": "n1"}], "unreadCount": 0}
            })
        );
    }

    #[tokio::test]
    async fn malformed_snapshot_is_dropped() {
        let manager = Arc::new(Manager::default());
        let handler = SseDomainEventHandler::new(manager.clone());
        let user_id = Id::new_v4();
        let mut stream = manager.open_stream(user_id.to_string(), Snapshot::empty());

        handler
            .handle(&DomainEvent::NotificationsUpdated {
                user_id,
                snapshot: json!({"unexpected": true}),
            })
            .await;

        let _initial = next_frame(&mut stream).await;
        assert!(
            tokio::time::timeout(std::time::Duration::from_millis(20), stream.next())
                .await
                .is_err()
        );
    }
}
