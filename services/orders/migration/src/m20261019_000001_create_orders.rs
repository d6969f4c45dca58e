use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Orders::OrderId)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::Customer).string().not_null())
                    .col(ColumnDef::new(Orders::Total).decimal_len(12, 2).not_null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(Orders::Attempts)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::LockedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Orders::LastError).text())
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    OrderId,
    Customer,
    Total,
    Status,
    Attempts,
    LockedAt,
    LastError,
    CreatedAt,
}
