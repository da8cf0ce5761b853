//! Notifications: snapshot reads, the event producer and read-state changes.
//!
//! Every write goes to the repository first. Only after it succeeds is a
//! `DomainEvent` published, so a subscriber can never be shown a notification
//! that was not stored. Publishing itself never fails the caller: anything
//! missed live is picked up by the next snapshot.

use crate::error::{DomainErrorKind, EntityErrorKind, Error, InternalErrorKind};
use crate::Id;
use entity::notification_type::NotificationType;
use events::{DomainEvent, EventPublisher};
use log::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub use entity::notifications::Model as Notification;
pub use repository::{DbNotificationRepository, NotificationRepository};
pub use trigger::Trigger;

#[cfg(any(test, feature = "mock"))]
pub use repository::InMemoryNotificationRepository;

mod repository;
mod trigger;

/// Most notifications a snapshot carries.
pub const SNAPSHOT_LIMIT: u64 = 20;

/// A user's most recent notifications plus their total unread count.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSnapshot {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

/// A notification to be stored and pushed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewNotification {
    #[schema(value_type = Uuid)]
    pub user_id: Id,
    pub title: String,
    pub message: String,
    #[serde(rename = "type", default)]
    pub notification_type: NotificationType,
    #[serde(default)]
    pub link: Option<String>,
}

impl NewNotification {
    pub(crate) fn into_model(self) -> Notification {
        Notification {
            id: Id::new_v4(),
            user_id: self.user_id,
            title: self.title,
            message: self.message,
            notification_type: self.notification_type,
            link: self.link,
            is_read: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.title.trim().is_empty() || self.message.trim().is_empty() {
            return Err(Error {
                source: Some("notification title and message must not be empty".into()),
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                    EntityErrorKind::Invalid,
                )),
            });
        }
        Ok(())
    }
}

/// Reads the snapshot sent as the first frame of every stream.
pub async fn snapshot(
    repository: &dyn NotificationRepository,
    user_id: Id,
) -> Result<NotificationSnapshot, Error> {
    let notifications = repository.recent(user_id, SNAPSHOT_LIMIT).await?;
    let unread_count = repository.unread_count(user_id).await?;

    Ok(NotificationSnapshot {
        notifications,
        unread_count,
    })
}

/// Stores `notification` and pushes it to the owner's live streams.
///
/// A storage failure is returned and nothing is pushed. Having no live
/// streams is not an error.
pub async fn notify(
    repository: &dyn NotificationRepository,
    publisher: &EventPublisher,
    notification: NewNotification,
) -> Result<Notification, Error> {
    notification.validate()?;

    let created = repository.create(notification).await?;
    info!(
        "Created {} notification {} for user {}",
        created.notification_type, created.id, created.user_id
    );

    match serde_json::to_value(&created) {
        Ok(payload) => {
            publisher
                .publish(DomainEvent::NotificationCreated {
                    user_id: created.user_id,
                    notification: payload,
                })
                .await
        }
        Err(e) => warn!("Could not serialize notification {}: {e}", created.id),
    }

    Ok(created)
}

/// Convenience over `notify` for a business event.
pub async fn notify_trigger(
    repository: &dyn NotificationRepository,
    publisher: &EventPublisher,
    user_id: Id,
    trigger: Trigger,
) -> Result<Notification, Error> {
    notify(repository, publisher, trigger.into_notification(user_id)).await
}

pub async fn mark_as_read(
    repository: &dyn NotificationRepository,
    publisher: &EventPublisher,
    id: Id,
    user_id: Id,
) -> Result<Notification, Error> {
    let notification = repository.mark_as_read(id, user_id).await?;
    publish_snapshot(repository, publisher, user_id).await;
    Ok(notification)
}

pub async fn mark_all_as_read(
    repository: &dyn NotificationRepository,
    publisher: &EventPublisher,
    user_id: Id,
) -> Result<u64, Error> {
    let changed = repository.mark_all_as_read(user_id).await?;
    if changed > 0 {
        publish_snapshot(repository, publisher, user_id).await;
    }
    Ok(changed)
}

// Lets the user's other tabs resynchronize after a read-state change.
async fn publish_snapshot(
    repository: &dyn NotificationRepository,
    publisher: &EventPublisher,
    user_id: Id,
) {
    let fresh = match snapshot(repository, user_id).await {
        Ok(fresh) => fresh,
        Err(e) => {
            warn!("Skipping update frame for user {user_id}: {e}");
            return;
        }
    };

    match serde_json::to_value(&fresh) {
        Ok(snapshot) => {
            publisher
                .publish(DomainEvent::NotificationsUpdated { user_id, snapshot })
                .await
        }
        Err(e) => warn!("Could not serialize snapshot for user {user_id}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use events::EventHandler;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingHandler {
        events: Mutex<Vec<DomainEvent>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: &DomainEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn setup() -> (
        InMemoryNotificationRepository,
        EventPublisher,
        Arc<RecordingHandler>,
    ) {
        let handler = Arc::new(RecordingHandler::default());
        let publisher = EventPublisher::new().with_handler(handler.clone());
        (InMemoryNotificationRepository::new(), publisher, handler)
    }

    fn new_notification(user_id: Id, title: &str) -> NewNotification {
        NewNotification {
            user_id,
            title: title.to_string(),
            message: format!("{title} message"),
            notification_type: NotificationType::ProjectUpdate,
            link: None,
        }
    }

    #[tokio::test]
    async fn notify_persists_then_publishes_the_record() {
        let (repo, publisher, handler) = setup();
        let user_id = Id::new_v4();

        let created = notify(&repo, &publisher, new_notification(user_id, "Board moved"))
            .await
            .unwrap();

        assert_eq!(repo.len(), 1);
        let events = handler.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        match &events[0] {
            DomainEvent::NotificationCreated {
                user_id: target,
                notification,
            } => {
                assert_eq!(*target, user_id);
                assert_eq!(notification["id"], created.id.to_string());
                assert_eq!(notification["type"], "project_update");
                assert_eq!(notification["isRead"], false);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn notify_does_not_publish_when_persistence_fails() {
        let (repo, publisher, handler) = setup();
        repo.set_failing(true);

        let err = notify(&repo, &publisher, new_notification(Id::new_v4(), "Lost"))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::DbTransaction))
        );
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn notify_succeeds_without_subscribers() {
        let repo = InMemoryNotificationRepository::new();

        let result = notify(
            &repo,
            &EventPublisher::new(),
            new_notification(Id::new_v4(), "Nobody home"),
        )
        .await;

        assert!(result.is_ok());
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn notify_rejects_blank_titles() {
        let (repo, publisher, handler) = setup();

        let err = notify(&repo, &publisher, new_notification(Id::new_v4(), "  "))
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Invalid))
        );
        assert!(repo.is_empty());
        assert!(handler.events.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_holds_the_twenty_most_recent_newest_first() {
        let (repo, publisher, _) = setup();
        let user_id = Id::new_v4();
        for i in 0..25 {
            notify(&repo, &publisher, new_notification(user_id, &format!("n{i}")))
                .await
                .unwrap();
        }
        notify(&repo, &publisher, new_notification(Id::new_v4(), "other user"))
            .await
            .unwrap();

        let snapshot = snapshot(&repo, user_id).await.unwrap();

        assert_eq!(snapshot.unread_count, 25);
        let titles: Vec<_> = snapshot
            .notifications
            .iter()
            .map(|n| n.title.as_str())
            .collect();
        let expected: Vec<String> = (5..25).rev().map(|i| format!("n{i}")).collect();
        assert_eq!(titles, expected);
    }

    #[tokio::test]
    async fn snapshot_serializes_unread_count_in_camel_case() {
        let snapshot = NotificationSnapshot {
            notifications: vec![],
            unread_count: 2,
        };

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json, serde_json::json!({"notifications": [], "unreadCount": 2}));
    }

    #[tokio::test]
    async fn mark_as_read_publishes_an_update_snapshot() {
        let (repo, publisher, handler) = setup();
        let user_id = Id::new_v4();
        let first = notify(&repo, &publisher, new_notification(user_id, "a"))
            .await
            .unwrap();
        notify(&repo, &publisher, new_notification(user_id, "b"))
            .await
            .unwrap();

        let read = mark_as_read(&repo, &publisher, first.id, user_id)
            .await
            .unwrap();

        assert!(read.is_read);
        let events = handler.events.lock().unwrap();
        match events.last() {
            Some(DomainEvent::NotificationsUpdated { snapshot, .. }) => {
                assert_eq!(snapshot["unreadCount"], 1);
                assert_eq!(snapshot["notifications"].as_array().unwrap().len(), 2);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn mark_as_read_of_another_users_notification_is_not_found() {
        let (repo, publisher, handler) = setup();
        let owner = Id::new_v4();
        let created = notify(&repo, &publisher, new_notification(owner, "mine"))
            .await
            .unwrap();

        let err = mark_as_read(&repo, &publisher, created.id, Id::new_v4())
            .await
            .unwrap_err();

        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound))
        );
        assert_eq!(handler.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mark_all_as_read_zeroes_the_unread_count() {
        let (repo, publisher, handler) = setup();
        let user_id = Id::new_v4();
        for title in ["a", "b", "c"] {
            notify(&repo, &publisher, new_notification(user_id, title))
                .await
                .unwrap();
        }

        let changed = mark_all_as_read(&repo, &publisher, user_id).await.unwrap();

        assert_eq!(changed, 3);
        assert_eq!(snapshot(&repo, user_id).await.unwrap().unread_count, 0);
        assert!(matches!(
            handler.events.lock().unwrap().last(),
            Some(DomainEvent::NotificationsUpdated { .. })
        ));
    }

    #[tokio::test]
    async fn notify_trigger_builds_the_notification() {
        let (repo, publisher, _) = setup();
        let user_id = Id::new_v4();

        let created = notify_trigger(
            &repo,
            &publisher,
            user_id,
            Trigger::LeadCaptured {
                lead_id: Id::new_v4(),
                lead_name: "Jordan".to_string(),
                source: "the contact form".to_string(),
            },
        )
        .await
        .unwrap();

        assert_eq!(created.notification_type, NotificationType::Lead);
        assert_eq!(created.user_id, user_id);
    }
}
