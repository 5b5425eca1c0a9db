//! Database migrations for gymledger.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2026_01_24_000001_create_gyms;
mod m2026_01_24_000002_create_members;
mod m2026_02_01_070042_create_ledger_entries;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2026_01_24_000001_create_gyms::Migration),
            Box::new(m2026_01_24_000002_create_members::Migration),
            Box::new(m2026_02_01_070042_create_ledger_entries::Migration),
        ]
    }
}
