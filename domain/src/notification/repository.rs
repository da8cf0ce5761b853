use super::{NewNotification, Notification};
use crate::error::Error;
use crate::Id;
use async_trait::async_trait;
use entity_api::notification as notification_api;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Persistence collaborator for notifications.
///
/// Implementations report failures as domain errors; callers never see the
/// underlying storage error types.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create(&self, notification: NewNotification) -> Result<Notification, Error>;

    /// The user's `limit` most recent notifications, newest first.
    async fn recent(&self, user_id: Id, limit: u64) -> Result<Vec<Notification>, Error>;

    async fn unread_count(&self, user_id: Id) -> Result<u64, Error>;

    async fn mark_as_read(&self, id: Id, user_id: Id) -> Result<Notification, Error>;

    /// Returns how many notifications changed state.
    async fn mark_all_as_read(&self, user_id: Id) -> Result<u64, Error>;
}

/// `NotificationRepository` backed by the relational database.
pub struct DbNotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl DbNotificationRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NotificationRepository for DbNotificationRepository {
    async fn create(&self, notification: NewNotification) -> Result<Notification, Error> {
        Ok(notification_api::create(&self.db, notification.into_model()).await?)
    }

    async fn recent(&self, user_id: Id, limit: u64) -> Result<Vec<Notification>, Error> {
        Ok(notification_api::find_recent_by_user(&self.db, user_id, limit).await?)
    }

    async fn unread_count(&self, user_id: Id) -> Result<u64, Error> {
        Ok(notification_api::count_unread_by_user(&self.db, user_id).await?)
    }

    async fn mark_as_read(&self, id: Id, user_id: Id) -> Result<Notification, Error> {
        Ok(notification_api::mark_as_read(&self.db, id, user_id).await?)
    }

    async fn mark_all_as_read(&self, user_id: Id) -> Result<u64, Error> {
        Ok(notification_api::mark_all_as_read(&self.db, user_id).await?)
    }
}

#[cfg(any(test, feature = "mock"))]
pub use memory::InMemoryNotificationRepository;

#[cfg(any(test, feature = "mock"))]
mod memory {
    use super::*;
    use crate::error::{DomainErrorKind, EntityErrorKind, InternalErrorKind};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    /// Process-local repository for tests of the layers above persistence.
    #[derive(Default)]
    pub struct InMemoryNotificationRepository {
        rows: Mutex<Vec<Notification>>,
        failing: AtomicBool,
    }

    impl InMemoryNotificationRepository {
        pub fn new() -> Self {
            Self::default()
        }

        /// While set, every operation fails as if the database were unreachable.
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        pub fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }

        pub fn is_empty(&self) -> bool {
            self.len() == 0
        }

        fn check(&self) -> Result<(), Error> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(Error {
                    source: Some("database unavailable".into()),
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                        EntityErrorKind::DbTransaction,
                    )),
                });
            }
            Ok(())
        }

        fn not_found() -> Error {
            Error {
                source: None,
                error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                    EntityErrorKind::NotFound,
                )),
            }
        }
    }

    #[async_trait]
    impl NotificationRepository for InMemoryNotificationRepository {
        async fn create(&self, notification: NewNotification) -> Result<Notification, Error> {
            self.check()?;
            let mut model = notification.into_model();
            model.created_at = chrono::Utc::now().into();
            self.rows.lock().unwrap().push(model.clone());
            Ok(model)
        }

        async fn recent(&self, user_id: Id, limit: u64) -> Result<Vec<Notification>, Error> {
            self.check()?;
            // Reverse first so rows created within the same instant stay newest first.
            let mut rows: Vec<Notification> = self
                .rows
                .lock()
                .unwrap()
                .iter()
                .rev()
                .filter(|n| n.user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn unread_count(&self, user_id: Id) -> Result<u64, Error> {
            self.check()?;
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|n| n.user_id == user_id && !n.is_read)
                .count() as u64)
        }

        async fn mark_as_read(&self, id: Id, user_id: Id) -> Result<Notification, Error> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|n| n.id == id && n.user_id == user_id)
                .ok_or_else(Self::not_found)?;
            row.is_read = true;
            Ok(row.clone())
        }

        async fn mark_all_as_read(&self, user_id: Id) -> Result<u64, Error> {
            self.check()?;
            let mut changed = 0;
            for row in self
                .rows
                .lock()
                .unwrap()
                .iter_mut()
                .filter(|n| n.user_id == user_id && !n.is_read)
            {
                row.is_read = true;
                changed += 1;
            }
            Ok(changed)
        }
    }
}
