use sea_orm_migration::prelude::*;
use sea_orm_migration::schema::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Todos {
    Table,
    Id,
    Task,
    Status,
    Priority,
    CreatedAt,
    UpdatedAt,
}

/// Literals accepted by the `priority` check constraint.
const PRIORITIES: [&str; 3] = ["Low", "Medium", "High"];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Todos::Table)
                    .if_not_exists()
                    .col(pk_auto(Todos::Id))
                    .col(text(Todos::Task))
                    .col(text(Todos::Status).default("created"))
                    .col(text(Todos::Priority).check(Expr::col(Todos::Priority).is_in(PRIORITIES)))
                    .col(
                        timestamp_with_time_zone(Todos::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Todos::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Todos::Table).to_owned())
            .await
    }
}
