use super::error::{EntityApiErrorKind, Error};
use entity::notifications::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::debug;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, DatabaseConnection, PaginatorTrait,
    QueryOrder, QuerySelect,
};

/// Inserts a new notification. The row is always stored unread with a fresh
/// creation timestamp.
pub async fn create(db: &DatabaseConnection, model: Model) -> Result<Model, Error> {
    debug!(
        "Creating {} notification for user_id: {}",
        model.notification_type, model.user_id
    );

    let active_model = ActiveModel {
        id: Set(model.id),
        user_id: Set(model.user_id),
        title: Set(model.title),
        message: Set(model.message),
        notification_type: Set(model.notification_type),
        link: Set(model.link),
        is_read: Set(false),
        created_at: Set(chrono::Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Returns up to `limit` of the user's notifications, newest first.
pub async fn find_recent_by_user(
    db: &DatabaseConnection,
    user_id: Id,
    limit: u64,
) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .limit(limit)
        .all(db)
        .await?)
}

pub async fn count_unread_by_user(db: &DatabaseConnection, user_id: Id) -> Result<u64, Error> {
    Ok(Entity::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::IsRead.eq(false))
        .count(db)
        .await?)
}

/// Marks one of the user's notifications read. A notification owned by a
/// different user is reported as not found.
pub async fn mark_as_read(db: &DatabaseConnection, id: Id, user_id: Id) -> Result<Model, Error> {
    let existing = Entity::find_by_id(id)
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordNotFound,
        })?;

    if existing.is_read {
        return Ok(existing);
    }

    debug!("Marking notification {id} read");

    let mut active_model: ActiveModel = existing.into();
    active_model.is_read = Set(true);

    Ok(active_model.update(db).await?)
}

/// Marks every unread notification of the user read, returning how many rows changed.
pub async fn mark_all_as_read(db: &DatabaseConnection, user_id: Id) -> Result<u64, Error> {
    let result = Entity::update_many()
        .col_expr(Column::IsRead, Expr::value(true))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::IsRead.eq(false))
        .exec(db)
        .await?;

    debug!(
        "Marked {} notifications read for user_id: {user_id}",
        result.rows_affected
    );

    Ok(result.rows_affected)
}

#[cfg(test)]
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use entity::notification_type::NotificationType;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};
    use std::collections::BTreeMap;

    fn test_model(user_id: Id) -> Model {
        Model {
            id: Id::new_v4(),
            user_id,
            title: "Invoice paid".to_string(),
            message: "Invoice INV-7 was paid".to_string(),
            notification_type: NotificationType::Invoice,
            link: Some("/invoices/7".to_string()),
            is_read: false,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn create_returns_the_inserted_notification() -> Result<(), Error> {
        let model = test_model(Id::new_v4());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let created = create(&db, model.clone()).await?;

        assert_eq!(created.id, model.id);
        assert!(!created.is_read);
        Ok(())
    }

    #[tokio::test]
    async fn find_recent_by_user_orders_newest_first_and_limits() -> Result<(), Error> {
        let user_id = Id::new_v4();
        let rows = vec![test_model(user_id), test_model(user_id)];

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![rows.clone()])
            .into_connection();

        let found = find_recent_by_user(&db, user_id, 20).await?;
        assert_eq!(found, rows);

        let log = db.into_transaction_log();
        let sql = &log[0].statements()[0].sql;
        assert!(sql.contains(r#"ORDER BY "notifications"."created_at" DESC"#));
        assert!(sql.contains("LIMIT"));
        Ok(())
    }

    #[tokio::test]
    async fn count_unread_by_user_returns_the_count() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![BTreeMap::from([(
                "num_items",
                Value::BigInt(Some(3)),
            )])]])
            .into_connection();

        assert_eq!(count_unread_by_user(&db, Id::new_v4()).await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn mark_as_read_updates_an_unread_notification() -> Result<(), Error> {
        let model = test_model(Id::new_v4());
        let updated = Model {
            is_read: true,
            ..model.clone()
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .append_query_results(vec![vec![updated.clone()]])
            .into_connection();

        let result = mark_as_read(&db, model.id, model.user_id).await?;

        assert!(result.is_read);
        Ok(())
    }

    #[tokio::test]
    async fn mark_as_read_skips_the_write_when_already_read() -> Result<(), Error> {
        let model = Model {
            is_read: true,
            ..test_model(Id::new_v4())
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results(vec![vec![model.clone()]])
            .into_connection();

        let result = mark_as_read(&db, model.id, model.user_id).await?;

        assert_eq!(result, model);
        assert_eq!(db.into_transaction_log().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn mark_as_read_rejects_another_users_notification() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results::<Model, Vec<Model>, _>(vec![vec![]])
            .into_connection();

        let result = mark_as_read(&db, Id::new_v4(), Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn mark_all_as_read_returns_rows_affected() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results(vec![MockExecResult {
                last_insert_id: 0,
                rows_affected: 4,
            }])
            .into_connection();

        assert_eq!(mark_all_as_read(&db, Id::new_v4()).await?, 4);
        Ok(())
    }
}
