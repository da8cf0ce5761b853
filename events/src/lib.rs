//! Event system infrastructure for the Freelance Platform.
//!
//! Business operations publish `DomainEvent`s after their persistence write
//! succeeds. Handlers registered on the `EventPublisher` turn them into side
//! effects; the real-time notification stream is one such handler.
//!
//! # Architecture
//!
//! - **DomainEvent**: Enum representing business events that affect notification subscribers
//! - **EventHandler**: Trait for implementing event handlers
//! - **EventPublisher**: Publishes events to registered handlers
//!
//! This crate has no dependencies on internal crates (entity, domain, etc.),
//! avoiding circular dependencies. Entity data is carried as serialized JSON values.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

/// A type alias that represents any Entity's internal id field data type.
/// This matches the definition in the entity crate to maintain compatibility.
pub type Id = Uuid;

/// Domain events that represent business-level changes in the system.
/// These events are emitted when domain operations complete successfully.
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A notification row was persisted for `user_id`.
    NotificationCreated {
        /// Owner of the notification and of the streams it should reach.
        user_id: Id,
        /// Complete serialized notification record, in its wire shape.
        notification: Value,
    },
    /// The read state of `user_id`'s notifications changed.
    /// Carries the fresh snapshot so every open tab can resynchronize.
    NotificationsUpdated {
        user_id: Id,
        /// Serialized `{ notifications, unreadCount }` snapshot.
        snapshot: Value,
    },
}

impl DomainEvent {
    /// The subscriber this event is addressed to.
    pub fn user_id(&self) -> Id {
        match self {
            DomainEvent::NotificationCreated { user_id, .. }
            | DomainEvent::NotificationsUpdated { user_id, .. } => *user_id,
        }
    }
}

/// Trait for handling domain events.
/// Implementations can perform side effects like sending notifications,
/// updating caches, logging, etc.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: &DomainEvent);
}

/// Publishes domain events to registered handlers.
/// Handlers are called sequentially in registration order.
#[derive(Clone)]
pub struct EventPublisher {
    handlers: Arc<Vec<Arc<dyn EventHandler>>>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self {
            handlers: Arc::new(Vec::new()),
        }
    }

    /// Register a new event handler.
    /// Note: This creates a new publisher instance with the additional handler.
    /// Store the returned publisher in your application state.
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let mut handlers = (*self.handlers).clone();
        handlers.push(handler);
        self.handlers = Arc::new(handlers);
        self
    }

    /// Publish an event to all registered handlers.
    /// Handlers are called sequentially and have no error path, so one
    /// handler can never prevent the next from running.
    pub async fn publish(&self, event: DomainEvent) {
        for handler in self.handlers.iter() {
            handler.handle(&event).await;
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingHandler {
        seen: Mutex<Vec<Id>>,
    }

    #[async_trait]
    impl EventHandler for RecordingHandler {
        async fn handle(&self, event: &DomainEvent) {
            self.seen.lock().unwrap().push(event.user_id());
        }
    }

    #[tokio::test]
    async fn publish_reaches_every_registered_handler() {
        let first = Arc::new(RecordingHandler {
            seen: Mutex::new(vec![]),
        });
        let second = Arc::new(RecordingHandler {
            seen: Mutex::new(vec![]),
        });
        let publisher = EventPublisher::new()
            .with_handler(first.clone())
            .with_handler(second.clone());

        let user_id = Id::new_v4();
        publisher
            .publish(DomainEvent::NotificationCreated {
                user_id,
                notification: json!({"id": "n1"}),
            })
            .await;

        assert_eq!(*first.seen.lock().unwrap(), vec![user_id]);
        assert_eq!(*second.seen.lock().unwrap(), vec![user_id]);
    }

    #[tokio::test]
    async fn publish_without_handlers_is_a_no_op() {
        EventPublisher::default()
            .publish(DomainEvent::NotificationsUpdated {
                user_id: Id::new_v4(),
                snapshot: json!({"notifications": [], "unreadCount": 0}),
            })
            .await;
    }
}
