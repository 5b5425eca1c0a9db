//! Migration to create the ledger_entries table.
//!
//! Entries reference members loosely (no foreign key) so that deleting a member keeps
//! its history; the member's full name is frozen into `member_name`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LedgerEntries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LedgerEntries::GymId).uuid().not_null())
                    .col(
                        ColumnDef::new(LedgerEntries::Message)
                            .string_len(300)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Amount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::Kind)
                            .string_len(32)
                            .not_null()
                            .default("income"),
                    )
                    .col(ColumnDef::new(LedgerEntries::MemberId).uuid().null())
                    .col(
                        ColumnDef::new(LedgerEntries::MemberName)
                            .string_len(200)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(LedgerEntries::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_gym_id")
                            .from(LedgerEntries::Table, LedgerEntries::GymId)
                            .to(Gyms::Table, Gyms::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_gym_occurred_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::GymId)
                    .col(LedgerEntries::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_ledger_entries_gym_occurred_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    GymId,
    Message,
    Amount,
    Kind,
    MemberId,
    MemberName,
    OccurredAt,
}

#[derive(DeriveIden)]
enum Gyms {
    Table,
    Id,
}
