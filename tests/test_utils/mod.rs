//! Test utilities for database testing.
//!
//! In-memory SQLite with migrations for every repository, and a Postgres database for the
//! `NUMERIC` and optimistic-update paths: either the one named by
//! `GYMLEDGER_TEST_DATABASE_URL` or a throwaway testcontainers instance.

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use gymledger::models::gym::Model as GymModel;
use gymledger::repositories::{GymRepository, GymStore};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use testcontainers::{ContainerAsync, core::IntoContainerPort, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;

/// Environment variable naming a disposable Postgres database for repository tests.
pub const TEST_DATABASE_URL_VAR: &str = "GYMLEDGER_TEST_DATABASE_URL";

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

#[allow(dead_code)]
pub async fn setup_test_db_arc() -> Result<Arc<DatabaseConnection>> {
    Ok(Arc::new(setup_test_db().await?))
}

/// A migrated Postgres connection. Holds the container, if any, for the test's lifetime.
#[allow(dead_code)]
pub struct PostgresDb {
    pub db: Arc<DatabaseConnection>,
    _container: Option<ContainerAsync<Postgres>>,
}

/// Connects to [`TEST_DATABASE_URL_VAR`] when set, otherwise starts a Postgres container.
///
/// Returns `None` (after a notice on stderr) when neither is available.
#[allow(dead_code)]
pub async fn setup_postgres_db() -> Result<Option<PostgresDb>> {
    if let Some(url) = std::env::var(TEST_DATABASE_URL_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
    {
        let db = Database::connect(&url).await?;
        Migrator::up(&db, None).await?;
        return Ok(Some(PostgresDb {
            db: Arc::new(db),
            _container: None,
        }));
    }

    let container = match Postgres::default().start().await {
        Ok(container) => container,
        Err(error) => {
            eprintln!(
                "Skipping Postgres repository test: no container runtime ({error}) and {TEST_DATABASE_URL_VAR} is unset."
            );
            return Ok(None);
        }
    };

    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432.tcp()).await?;
    let db = Database::connect(format!("postgres://postgres:postgres@{host}:{port}/postgres")).await?;
    Migrator::up(&db, None).await?;

    Ok(Some(PostgresDb {
        db: Arc::new(db),
        _container: Some(container),
    }))
}

/// Fixed instant on 2025-01-01 at `hour`:00 UTC. Postgres keeps microseconds, so fixtures
/// use whole seconds to compare equal after a round trip.
#[allow(dead_code)]
pub fn instant(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap()
}

/// Inserts a trial gym created at 09:00 and returns it.
#[allow(dead_code)]
pub async fn create_test_gym(db: Arc<DatabaseConnection>, name: &str) -> Result<GymModel> {
    let repo = GymRepository::new(db);
    Ok(repo.insert(GymModel::new_trial(name, instant(9))).await?)
}
