//! Migration to create the members table.
//!
//! Members carry their paid-until instant (`expires_at`); status is never stored.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Members::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Members::GymId).uuid().not_null())
                    .col(ColumnDef::new(Members::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Members::Surname).string_len(100).not_null())
                    .col(ColumnDef::new(Members::Email).string_len(254).null())
                    .col(
                        ColumnDef::new(Members::Phone)
                            .string_len(50)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Members::Address).text().null())
                    .col(
                        ColumnDef::new(Members::IsDailyPass)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Members::PurchasedDays).integer().not_null())
                    .col(
                        ColumnDef::new(Members::LastPrice)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Members::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Members::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_members_gym_id")
                            .from(Members::Table, Members::GymId)
                            .to(Gyms::Table, Gyms::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        // Tenant-scoped listing and the (name, surname) duplicate lookup used by imports
        manager
            .create_index(
                Index::create()
                    .name("idx_members_gym_name_surname")
                    .table(Members::Table)
                    .col(Members::GymId)
                    .col(Members::Name)
                    .col(Members::Surname)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_members_gym_expires_at")
                    .table(Members::Table)
                    .col(Members::GymId)
                    .col(Members::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_members_gym_expires_at").to_owned())
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .name("idx_members_gym_name_surname")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Members {
    Table,
    Id,
    GymId,
    Name,
    Surname,
    Email,
    Phone,
    Address,
    IsDailyPass,
    PurchasedDays,
    LastPrice,
    CreatedAt,
    UpdatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum Gyms {
    Table,
    Id,
}
