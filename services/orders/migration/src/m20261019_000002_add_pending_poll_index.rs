use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Worker poll: status = PENDING AND locked_at IS NULL ORDER BY created_at.
        manager
            .create_index(
                Index::create()
                    .table(Orders::Table)
                    .col(Orders::Status)
                    .col(Orders::LockedAt)
                    .col(Orders::CreatedAt)
                    .name("idx_orders_status_locked_at_created_at")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_status_locked_at_created_at")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Status,
    LockedAt,
    CreatedAt,
}
