//! Create outside event table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OutsideEvent::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OutsideEvent::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OutsideEvent::Title).string_len(256).not_null())
                    .col(ColumnDef::new(OutsideEvent::Description).text())
                    .col(
                        ColumnDef::new(OutsideEvent::PointValue)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(OutsideEvent::Date)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OutsideEvent::Approved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(OutsideEvent::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(OutsideEvent::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_outside_event_user")
                            .from(OutsideEvent::Table, OutsideEvent::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: approved (for the admin review queue)
        manager
            .create_index(
                Index::create()
                    .name("idx_outside_event_approved")
                    .table(OutsideEvent::Table)
                    .col(OutsideEvent::Approved)
                    .to_owned(),
            )
            .await?;

        // Index: user_id (for per-user summaries)
        manager
            .create_index(
                Index::create()
                    .name("idx_outside_event_user_id")
                    .table(OutsideEvent::Table)
                    .col(OutsideEvent::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OutsideEvent::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum OutsideEvent {
    Table,
    Id,
    Title,
    Description,
    PointValue,
    Date,
    Approved,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
