//! Migration to create the gyms table.
//!
//! Gyms are the tenants of the system: every member and ledger entry is owned by
//! exactly one gym.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Gyms::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Gyms::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Gyms::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Gyms::OwnerName).string_len(200).null())
                    .col(ColumnDef::new(Gyms::Phone).string_len(50).null())
                    .col(ColumnDef::new(Gyms::Email).string_len(254).null())
                    .col(ColumnDef::new(Gyms::CredentialRef).text().null())
                    .col(
                        ColumnDef::new(Gyms::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Gyms::IsTrial)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Gyms::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Gyms::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Gyms::IsActive).ne(Expr::col(Gyms::IsTrial)))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Gyms::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Gyms {
    Table,
    Id,
    Name,
    OwnerName,
    Phone,
    Email,
    CredentialRef,
    IsActive,
    IsTrial,
    CreatedAt,
    UpdatedAt,
}
