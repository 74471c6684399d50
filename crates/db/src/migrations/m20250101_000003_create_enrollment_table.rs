//! Create enrollment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enrollment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enrollment::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enrollment::UserId).string_len(32).not_null())
                    .col(ColumnDef::new(Enrollment::EventId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(Enrollment::Status)
                            .string_len(16)
                            .not_null()
                            .default("JOIN"),
                    )
                    .col(
                        ColumnDef::new(Enrollment::ClaimPoint)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Enrollment::ReminderSent)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Enrollment::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_user")
                            .from(Enrollment::Table, Enrollment::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_enrollment_event")
                            .from(Enrollment::Table, Enrollment::EventId)
                            .to(Event::Table, Event::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (user_id, event_id) - a user enrolls in an event at most
        // once; backstop against concurrent double-enrollment
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_user_event")
                    .table(Enrollment::Table)
                    .col(Enrollment::UserId)
                    .col(Enrollment::EventId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: event_id (for per-event rosters and the reminder sweep)
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_event_id")
                    .table(Enrollment::Table)
                    .col(Enrollment::EventId)
                    .to_owned(),
            )
            .await?;

        // Index: (claim_point, status) for the admin review queue
        manager
            .create_index(
                Index::create()
                    .name("idx_enrollment_claim_status")
                    .table(Enrollment::Table)
                    .col(Enrollment::ClaimPoint)
                    .col(Enrollment::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Enrollment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Enrollment {
    Table,
    Id,
    UserId,
    EventId,
    Status,
    ClaimPoint,
    ReminderSent,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

#[derive(Iden)]
enum Event {
    Table,
    Id,
}
