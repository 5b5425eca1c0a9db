//! Integration tests for MemberRepository and LedgerRepository.
//!
//! Every scenario runs on in-memory SQLite. The same scenarios, plus the `NUMERIC`
//! rounding checks, also run on Postgres when a container runtime or
//! `GYMLEDGER_TEST_DATABASE_URL` is available.

use std::sync::Arc;

use anyhow::Result;
use chrono::Duration;
use gymledger::auth::CallerIdentity;
use gymledger::clock::{Clock, FixedClock};
use gymledger::config::AppConfig;
use gymledger::error::{RepositoryError, ServiceError};
use gymledger::ledger::ManualEntry;
use gymledger::membership::{MemberDraft, Renewal};
use gymledger::models::ledger_entry::{LedgerKind, Model as LedgerEntryModel};
use gymledger::models::member::Model as MemberModel;
use gymledger::repositories::{
    GymRepository, LedgerRepository, LedgerStore, MemberRepository, MembershipStore,
};
use gymledger::server::AppState;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_test_gym, instant, setup_postgres_db, setup_test_db_arc};

fn member(gym_id: Uuid, name: &str, surname: &str) -> MemberModel {
    MemberModel {
        id: Uuid::new_v4(),
        gym_id,
        name: name.to_string(),
        surname: surname.to_string(),
        email: None,
        phone: "555".to_string(),
        address: None,
        is_daily_pass: false,
        purchased_days: 30,
        last_price: dec!(25.50),
        created_at: instant(9),
        updated_at: instant(9),
        expires_at: instant(9) + Duration::days(30),
    }
}

fn draft(name: &str, surname: &str) -> MemberDraft {
    MemberDraft {
        name: name.to_string(),
        surname: surname.to_string(),
        email: None,
        phone: "555".to_string(),
        address: None,
        is_daily_pass: false,
        purchased_days: 30,
        last_price: dec!(25),
    }
}

fn services(db: Arc<DatabaseConnection>, clock: Arc<FixedClock>) -> AppState {
    AppState::from_stores(
        Arc::new(AppConfig::default()),
        Arc::new(GymRepository::new(db.clone())),
        Arc::new(MemberRepository::new(db.clone())),
        Arc::new(LedgerRepository::new(db)),
        clock,
    )
}

async fn upsert_is_optimistic_and_scoped(db: Arc<DatabaseConnection>) -> Result<()> {
    let gym = create_test_gym(db.clone(), "Iron Temple").await?;
    let repo = MemberRepository::new(db);

    let created = repo.upsert(member(gym.id, "Ana", "Lopez"), None).await?;
    assert_eq!(created.last_price, dec!(25.50));

    let renewed = MemberModel {
        last_price: dec!(30),
        updated_at: instant(10),
        ..created.clone()
    };
    let stored = repo.upsert(renewed.clone(), Some(created.updated_at)).await?;
    assert_eq!(stored.last_price, dec!(30));
    assert_eq!(stored.updated_at, instant(10));
    assert_eq!(stored.created_at, created.created_at);

    // A writer holding the stale timestamp loses
    let stale = repo.upsert(renewed, Some(created.updated_at)).await;
    assert!(matches!(stale, Err(RepositoryError::Conflict(_))));

    // Updating a member that does not exist is not a conflict
    let ghost = member(gym.id, "Ghost", "Nobody");
    let missing = repo.upsert(ghost.clone(), Some(ghost.updated_at)).await;
    assert!(matches!(missing, Err(RepositoryError::NotFound(_))));

    // Another gym cannot see, update or delete the member
    let other = Uuid::new_v4();
    assert!(repo.get(other, created.id).await?.is_none());
    let foreign = repo
        .upsert(
            MemberModel {
                gym_id: other,
                ..stored.clone()
            },
            Some(stored.updated_at),
        )
        .await;
    assert!(matches!(foreign, Err(RepositoryError::NotFound(_))));
    assert!(matches!(
        repo.delete(other, created.id).await,
        Err(RepositoryError::NotFound(_))
    ));

    repo.delete(gym.id, created.id).await?;
    assert!(!repo.exists_any(gym.id).await?);
    Ok(())
}

async fn members_list_by_surname_then_name(db: Arc<DatabaseConnection>) -> Result<()> {
    let gym = create_test_gym(db.clone(), "Iron Temple").await?;
    let repo = MemberRepository::new(db);

    for (name, surname) in [("Luis", "Perez"), ("Bea", "Lopez"), ("Ana", "Lopez")] {
        repo.upsert(member(gym.id, name, surname), None).await?;
    }

    let names: Vec<String> = repo
        .list(gym.id)
        .await?
        .iter()
        .map(|m| m.full_name())
        .collect();
    assert_eq!(names, vec!["Ana Lopez", "Bea Lopez", "Luis Perez"]);
    assert!(repo.list(Uuid::new_v4()).await?.is_empty());
    Ok(())
}

async fn ledger_lists_newest_first_and_updates_in_place(db: Arc<DatabaseConnection>) -> Result<()> {
    let gym = create_test_gym(db.clone(), "Iron Temple").await?;
    let repo = LedgerRepository::new(db);

    let entry = |amount, hour| LedgerEntryModel {
        id: Uuid::new_v4(),
        gym_id: gym.id,
        message: "Towels".to_string(),
        amount,
        kind: LedgerKind::classify(amount),
        member_id: None,
        member_name: None,
        occurred_at: instant(hour),
    };

    let older = repo.append(entry(dec!(-12.50), 8)).await?;
    let newer = repo.append(entry(dec!(40), 11)).await?;

    let listed: Vec<Uuid> = repo.list(gym.id).await?.iter().map(|e| e.id).collect();
    assert_eq!(listed, vec![newer.id, older.id]);

    let edited = repo
        .update(LedgerEntryModel {
            amount: dec!(12.50),
            kind: LedgerKind::Income,
            ..older.clone()
        })
        .await?;
    assert_eq!(edited.kind, LedgerKind::Income);
    assert_eq!(edited.amount, dec!(12.50));
    assert_eq!(edited.occurred_at, older.occurred_at);

    assert!(repo.get(Uuid::new_v4(), older.id).await?.is_none());
    repo.delete(gym.id, older.id).await?;
    assert!(repo.get(gym.id, older.id).await?.is_none());
    assert!(matches!(
        repo.delete(gym.id, older.id).await,
        Err(RepositoryError::NotFound(_))
    ));
    Ok(())
}

async fn services_renew_and_log(db: Arc<DatabaseConnection>) -> Result<()> {
    let gym = create_test_gym(db.clone(), "Iron Temple").await?;
    let clock = Arc::new(FixedClock::new(instant(9)));
    let state = services(db, clock.clone());
    let staff = CallerIdentity::Tenant(gym.id);

    let created = state
        .members
        .create(&staff, gym.id, draft("Ana", "Lopez"))
        .await?;

    clock.advance(Duration::days(45));
    let renewed = state
        .members
        .renew(
            &staff,
            gym.id,
            created.id,
            Renewal {
                days: 10,
                price: dec!(9.50),
            },
        )
        .await?;
    // Lapsed, so the window restarts from now
    assert_eq!(renewed.expires_at, clock.now() + Duration::days(10));

    let kinds: Vec<LedgerKind> = state
        .ledger
        .list(&staff, gym.id)
        .await?
        .iter()
        .map(|entry| entry.kind)
        .collect();
    assert_eq!(kinds, vec![LedgerKind::MemberRenewed, LedgerKind::MemberCreated]);
    Ok(())
}

async fn unknown_gym_is_not_found(db: Arc<DatabaseConnection>) -> Result<()> {
    let state = services(db, Arc::new(FixedClock::new(instant(9))));
    let unknown = Uuid::new_v4();
    let staff = CallerIdentity::Tenant(unknown);

    let created = state.members.create(&staff, unknown, draft("Ana", "Lopez")).await;
    assert!(matches!(created, Err(ServiceError::NotFound(_))));

    let recorded = state
        .ledger
        .record_manual(
            &staff,
            unknown,
            ManualEntry {
                message: "Towels".to_string(),
                amount: dec!(-5),
            },
        )
        .await;
    assert!(matches!(recorded, Err(ServiceError::NotFound(_))));
    Ok(())
}

#[tokio::test]
async fn sqlite_member_upsert_is_optimistic_and_scoped() -> Result<()> {
    upsert_is_optimistic_and_scoped(setup_test_db_arc().await?).await
}

#[tokio::test]
async fn sqlite_members_list_by_surname_then_name() -> Result<()> {
    members_list_by_surname_then_name(setup_test_db_arc().await?).await
}

#[tokio::test]
async fn sqlite_ledger_lists_newest_first_and_updates_in_place() -> Result<()> {
    ledger_lists_newest_first_and_updates_in_place(setup_test_db_arc().await?).await
}

#[tokio::test]
async fn sqlite_services_renew_and_log() -> Result<()> {
    services_renew_and_log(setup_test_db_arc().await?).await
}

#[tokio::test]
async fn sqlite_unknown_gym_is_not_found() -> Result<()> {
    unknown_gym_is_not_found(setup_test_db_arc().await?).await
}

#[tokio::test]
async fn postgres_member_upsert_is_optimistic_and_scoped() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    upsert_is_optimistic_and_scoped(pg.db.clone()).await
}

#[tokio::test]
async fn postgres_members_list_by_surname_then_name() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    members_list_by_surname_then_name(pg.db.clone()).await
}

#[tokio::test]
async fn postgres_ledger_lists_newest_first_and_updates_in_place() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    ledger_lists_newest_first_and_updates_in_place(pg.db.clone()).await
}

#[tokio::test]
async fn postgres_services_renew_and_log() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    services_renew_and_log(pg.db.clone()).await
}

#[tokio::test]
async fn postgres_unknown_gym_is_not_found() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    unknown_gym_is_not_found(pg.db.clone()).await
}

/// Services round to cents before storage, so Postgres returns exactly what was accepted.
#[tokio::test]
async fn postgres_stores_service_rounded_cents() -> Result<()> {
    let Some(pg) = setup_postgres_db().await? else {
        return Ok(());
    };
    let gym = create_test_gym(pg.db.clone(), "Iron Temple").await?;
    let state = services(pg.db.clone(), Arc::new(FixedClock::new(instant(9))));
    let staff = CallerIdentity::Tenant(gym.id);

    let mut sub_cent = draft("Ana", "Lopez");
    sub_cent.last_price = dec!(10.005);
    let created = state.members.create(&staff, gym.id, sub_cent).await?;
    let stored = state.members.get(&staff, gym.id, created.id).await?;
    assert_eq!(created.last_price, dec!(10.01));
    assert_eq!(stored.last_price, dec!(10.01));

    let entry = state
        .ledger
        .record_manual(
            &staff,
            gym.id,
            ManualEntry {
                message: "Chalk".to_string(),
                amount: dec!(-9999999999.99),
            },
        )
        .await?;
    let reread = state.ledger.get(&staff, gym.id, entry.id).await?;
    assert_eq!(reread.amount, dec!(-9999999999.99));
    Ok(())
}
