use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // user_id references the users table owned by the account service,
        // so there is no foreign key here.
        let create_table_sql = r#"
            CREATE TABLE IF NOT EXISTS notifications (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                user_id UUID NOT NULL,

                title VARCHAR(255) NOT NULL,
                message TEXT NOT NULL,
                notification_type VARCHAR(32) NOT NULL DEFAULT 'system',
                link TEXT,
                is_read BOOLEAN NOT NULL DEFAULT FALSE,

                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

                CONSTRAINT notifications_type_check CHECK (notification_type IN
                    ('feedback', 'project_update', 'proposal', 'invoice', 'lead', 'system'))
            )
        "#;

        manager
            .get_connection()
            .execute_unprepared(create_table_sql)
            .await?;

        // Snapshot reads: newest first per user
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_created_at
                 ON notifications(user_id, created_at DESC)",
            )
            .await?;

        // Unread count
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_unread
                 ON notifications(user_id) WHERE is_read = FALSE",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TABLE IF EXISTS notifications")
            .await?;

        Ok(())
    }
}
